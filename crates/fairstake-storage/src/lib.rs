//! The storage contract (component H): every balance mutation, seed
//! rotation, game-state transition and leaderboard read the rest of the
//! system needs, expressed as one trait so the engine and the HTTP surface
//! never depend on whether they're backed by Postgres or an in-memory
//! fixture.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use fairstake_core::model::{
    Amount, AuthProvider, Bet, BetView, Coin, CoinId, GameId, GameRow, GameState,
    LeaderboardEntry, LeaderboardMetric, LeaderboardWindow, Referral, ReferralLink, ServerSeed,
    User, UserId, UserSeed,
};
use fairstake_core::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("amount {amount} exceeds balance for user {user_id} coin {coin_id}")]
    InsufficientBalance {
        user_id: UserId,
        coin_id: CoinId,
        amount: Decimal,
    },
    #[error("no balance row for user {user_id} coin {coin_id}")]
    NoBalance { user_id: UserId, coin_id: CoinId },
    #[error("unknown time window {0:?}")]
    UnknownWindow(LeaderboardWindow),
    #[error("backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Everything needed to persist a fresh game state row; the storage layer
/// assigns the id.
#[derive(Debug, Clone)]
pub struct NewGameState {
    pub game_id: GameId,
    pub user_id: UserId,
    pub coin_id: CoinId,
    pub uuid: String,
    pub amount: Decimal,
    pub bet_info: String,
    pub state: String,
    pub user_seed_id: u64,
    pub server_seed_id: u64,
}

/// Everything needed to persist a settled wager row; the storage layer
/// assigns the id and timestamp.
#[derive(Debug, Clone)]
pub struct NewBet {
    pub game_id: GameId,
    pub user_id: UserId,
    pub coin_id: CoinId,
    pub uuid: String,
    pub amount: Decimal,
    pub profit: Decimal,
    pub num_games: u32,
    pub outcomes: String,
    pub profits: String,
    pub bet_info: String,
    pub user_seed_id: u64,
    pub server_seed_id: u64,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn find_user_by_login(&self, login: &str) -> StorageResult<Option<User>>;
    async fn find_user(&self, user_id: UserId) -> StorageResult<Option<User>>;
    async fn create_user(
        &self,
        login: &str,
        username: &str,
        password_hash: &str,
        provider: AuthProvider,
    ) -> StorageResult<User>;

    async fn find_coin(&self, coin_id: CoinId) -> StorageResult<Option<Coin>>;
    async fn find_amount(&self, user_id: UserId, coin_id: CoinId) -> StorageResult<Option<Amount>>;
    async fn list_amounts(&self, user_id: UserId) -> StorageResult<Vec<Amount>>;

    async fn decrease_balance(
        &self,
        user_id: UserId,
        coin_id: CoinId,
        amount: &Decimal,
    ) -> StorageResult<()>;
    async fn increase_balance(
        &self,
        user_id: UserId,
        coin_id: CoinId,
        amount: &Decimal,
    ) -> StorageResult<()>;
    async fn sub_inc_balance(
        &self,
        user_id: UserId,
        coin_id: CoinId,
        sub_amount: &Decimal,
        add_amount: &Decimal,
    ) -> StorageResult<()>;

    async fn find_game(&self, game_id: GameId) -> StorageResult<Option<GameRow>>;
    /// The whole game catalogue, loaded once at startup and handed to the
    /// engine to build its live [`fairstake_games`] table from.
    async fn list_games(&self) -> StorageResult<Vec<GameRow>>;

    async fn latest_user_seed(&self, user_id: UserId) -> StorageResult<Option<UserSeed>>;
    async fn active_server_seed(&self, user_id: UserId) -> StorageResult<Option<ServerSeed>>;
    /// Reveals every previously un-revealed server seed for the user, then
    /// inserts and returns a fresh un-revealed one, atomically.
    async fn rotate_server_seed(&self, user_id: UserId, new_hash: &str) -> StorageResult<ServerSeed>;
    async fn rotate_user_seed(&self, user_id: UserId, new_seed: &str) -> StorageResult<UserSeed>;

    async fn get_game_state(
        &self,
        game_id: GameId,
        user_id: UserId,
        coin_id: CoinId,
    ) -> StorageResult<Option<GameState>>;
    async fn insert_game_state(&self, state: NewGameState) -> StorageResult<GameState>;
    async fn update_game_state(
        &self,
        game_id: GameId,
        user_id: UserId,
        coin_id: CoinId,
        state: &str,
    ) -> StorageResult<()>;
    async fn remove_game_state(
        &self,
        game_id: GameId,
        user_id: UserId,
        coin_id: CoinId,
    ) -> StorageResult<()>;

    async fn insert_bet(&self, bet: NewBet) -> StorageResult<Bet>;
    async fn list_bets(
        &self,
        game_name: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> StorageResult<Vec<BetView>>;
    async fn list_bets_for_user(
        &self,
        user_id: UserId,
        offset: i64,
        limit: i64,
    ) -> StorageResult<Vec<BetView>>;

    async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        window: LeaderboardWindow,
    ) -> StorageResult<Vec<LeaderboardEntry>>;

    async fn insert_refresh_token(&self, token: &str, user_id: UserId) -> StorageResult<()>;
    /// Deletes the token and returns the user it belonged to, if any.
    async fn revoke_refresh_token(&self, token: &str) -> StorageResult<Option<UserId>>;

    async fn create_referral_link(
        &self,
        user_id: UserId,
        link_name: &str,
    ) -> StorageResult<ReferralLink>;
    async fn find_referral_link_by_name(&self, link_name: &str) -> StorageResult<Option<ReferralLink>>;
    async fn create_referral(
        &self,
        refer_to: UserId,
        refer_name: u64,
        referral: UserId,
    ) -> StorageResult<Referral>;
    async fn list_referral_links_for_user(&self, user_id: UserId) -> StorageResult<Vec<ReferralLink>>;
}
