//! An in-memory [`Storage`] used by engine and fabric integration tests —
//! no database required to exercise the wager pipeline end to end.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use fairstake_core::decimal::zero;
use fairstake_core::model::{
    Amount, AuthProvider, Bet, BetView, Coin, CoinId, GameId, GameRow, GameState,
    LeaderboardEntry, LeaderboardMetric, LeaderboardWindow, Referral, ReferralLink, ServerSeed,
    User, UserId, UserSeed,
};
use fairstake_core::Decimal;
use num_traits::Zero;
use tokio::sync::RwLock;

use crate::{NewBet, NewGameState, Storage, StorageError, StorageResult};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    coins: HashMap<CoinId, Coin>,
    games: HashMap<GameId, GameRow>,
    amounts: HashMap<(UserId, CoinId), Decimal>,
    user_seeds: HashMap<UserId, Vec<UserSeed>>,
    server_seeds: HashMap<UserId, Vec<ServerSeed>>,
    game_states: HashMap<(GameId, UserId, CoinId), GameState>,
    bets: Vec<Bet>,
    refresh_tokens: HashMap<String, UserId>,
    referral_links: HashMap<String, ReferralLink>,
    referrals: Vec<Referral>,
}

/// A `Storage` backed entirely by process memory. Seeded with coins and
/// games up front; everything else is created through the trait the same
/// way a fresh Postgres database would be.
pub struct MemoryStorage {
    tables: RwLock<Tables>,
    next_id: AtomicU64,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Seeds a coin row directly, for test fixtures.
    pub async fn seed_coin(&self, id: CoinId, name: &str, price: Decimal) {
        self.tables.write().await.coins.insert(
            id,
            Coin {
                id,
                name: name.to_string(),
                price,
            },
        );
    }

    /// Seeds a game catalogue row directly, for test fixtures.
    pub async fn seed_game(&self, id: GameId, name: &str, parameters: &str) {
        self.tables.write().await.games.insert(
            id,
            GameRow {
                id,
                name: name.to_string(),
                parameters: parameters.to_string(),
            },
        );
    }

    /// Seeds a starting balance directly, for test fixtures.
    pub async fn seed_balance(&self, user_id: UserId, coin_id: CoinId, amount: Decimal) {
        self.tables.write().await.amounts.insert((user_id, coin_id), amount);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn find_user_by_login(&self, login: &str) -> StorageResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.login == login)
            .cloned())
    }

    async fn find_user(&self, user_id: UserId) -> StorageResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn create_user(
        &self,
        login: &str,
        username: &str,
        password_hash: &str,
        provider: AuthProvider,
    ) -> StorageResult<User> {
        let id = self.next();
        let user = User {
            id,
            registration_time: Utc::now(),
            login: login.to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            provider,
            user_level: 1,
        };
        self.tables.write().await.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_coin(&self, coin_id: CoinId) -> StorageResult<Option<Coin>> {
        Ok(self.tables.read().await.coins.get(&coin_id).cloned())
    }

    async fn find_amount(&self, user_id: UserId, coin_id: CoinId) -> StorageResult<Option<Amount>> {
        Ok(self
            .tables
            .read()
            .await
            .amounts
            .get(&(user_id, coin_id))
            .map(|amount| Amount {
                user_id,
                coin_id,
                amount: amount.clone(),
            }))
    }

    async fn list_amounts(&self, user_id: UserId) -> StorageResult<Vec<Amount>> {
        Ok(self
            .tables
            .read()
            .await
            .amounts
            .iter()
            .filter(|((uid, _), _)| *uid == user_id)
            .map(|((uid, cid), amount)| Amount {
                user_id: *uid,
                coin_id: *cid,
                amount: amount.clone(),
            })
            .collect())
    }

    async fn decrease_balance(
        &self,
        user_id: UserId,
        coin_id: CoinId,
        amount: &Decimal,
    ) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        let balance = tables
            .amounts
            .get(&(user_id, coin_id))
            .ok_or(StorageError::NoBalance { user_id, coin_id })?;
        if amount > balance {
            return Err(StorageError::InsufficientBalance {
                user_id,
                coin_id,
                amount: amount.clone(),
            });
        }
        let new_balance = balance - amount;
        tables.amounts.insert((user_id, coin_id), new_balance);
        Ok(())
    }

    async fn increase_balance(
        &self,
        user_id: UserId,
        coin_id: CoinId,
        amount: &Decimal,
    ) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        let balance = tables
            .amounts
            .get(&(user_id, coin_id))
            .cloned()
            .unwrap_or_else(zero);
        tables.amounts.insert((user_id, coin_id), balance + amount);
        Ok(())
    }

    async fn sub_inc_balance(
        &self,
        user_id: UserId,
        coin_id: CoinId,
        sub_amount: &Decimal,
        add_amount: &Decimal,
    ) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        let balance = tables
            .amounts
            .get(&(user_id, coin_id))
            .ok_or(StorageError::NoBalance { user_id, coin_id })?;
        if sub_amount > balance {
            return Err(StorageError::InsufficientBalance {
                user_id,
                coin_id,
                amount: sub_amount.clone(),
            });
        }
        let after_sub = balance - sub_amount;
        let after_add = after_sub + add_amount;
        tables.amounts.insert((user_id, coin_id), after_add);
        Ok(())
    }

    async fn find_game(&self, game_id: GameId) -> StorageResult<Option<GameRow>> {
        Ok(self.tables.read().await.games.get(&game_id).cloned())
    }

    async fn list_games(&self) -> StorageResult<Vec<GameRow>> {
        Ok(self.tables.read().await.games.values().cloned().collect())
    }

    async fn latest_user_seed(&self, user_id: UserId) -> StorageResult<Option<UserSeed>> {
        Ok(self
            .tables
            .read()
            .await
            .user_seeds
            .get(&user_id)
            .and_then(|seeds| seeds.last())
            .cloned())
    }

    async fn active_server_seed(&self, user_id: UserId) -> StorageResult<Option<ServerSeed>> {
        Ok(self
            .tables
            .read()
            .await
            .server_seeds
            .get(&user_id)
            .and_then(|seeds| seeds.iter().find(|s| !s.revealed))
            .cloned())
    }

    async fn rotate_server_seed(&self, user_id: UserId, new_hash: &str) -> StorageResult<ServerSeed> {
        let mut tables = self.tables.write().await;
        let seeds = tables.server_seeds.entry(user_id).or_default();
        for seed in seeds.iter_mut() {
            seed.revealed = true;
        }
        let id = self.next();
        let fresh = ServerSeed {
            id,
            user_id,
            server_seed: new_hash.to_string(),
            revealed: false,
            created_at: Utc::now(),
        };
        seeds.push(fresh.clone());
        Ok(fresh)
    }

    async fn rotate_user_seed(&self, user_id: UserId, new_seed: &str) -> StorageResult<UserSeed> {
        let mut tables = self.tables.write().await;
        let id = self.next();
        let fresh = UserSeed {
            id,
            user_id,
            user_seed: new_seed.to_string(),
            created_at: Utc::now(),
        };
        tables.user_seeds.entry(user_id).or_default().push(fresh.clone());
        Ok(fresh)
    }

    async fn get_game_state(
        &self,
        game_id: GameId,
        user_id: UserId,
        coin_id: CoinId,
    ) -> StorageResult<Option<GameState>> {
        Ok(self
            .tables
            .read()
            .await
            .game_states
            .get(&(game_id, user_id, coin_id))
            .cloned())
    }

    async fn insert_game_state(&self, state: NewGameState) -> StorageResult<GameState> {
        let mut tables = self.tables.write().await;
        let key = (state.game_id, state.user_id, state.coin_id);
        let id = self.next();
        let row = GameState {
            id,
            timestamp: Utc::now(),
            amount: state.amount,
            bet_info: state.bet_info,
            state: state.state,
            uuid: state.uuid,
            game_id: state.game_id,
            user_id: state.user_id,
            coin_id: state.coin_id,
            user_seed_id: state.user_seed_id,
            server_seed_id: state.server_seed_id,
        };
        tables.game_states.insert(key, row.clone());
        Ok(row)
    }

    async fn update_game_state(
        &self,
        game_id: GameId,
        user_id: UserId,
        coin_id: CoinId,
        state: &str,
    ) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(row) = tables.game_states.get_mut(&(game_id, user_id, coin_id)) {
            row.state = state.to_string();
        }
        Ok(())
    }

    async fn remove_game_state(
        &self,
        game_id: GameId,
        user_id: UserId,
        coin_id: CoinId,
    ) -> StorageResult<()> {
        self.tables
            .write()
            .await
            .game_states
            .remove(&(game_id, user_id, coin_id));
        Ok(())
    }

    async fn insert_bet(&self, bet: NewBet) -> StorageResult<Bet> {
        let mut tables = self.tables.write().await;
        let id = self.next();
        let row = Bet {
            id,
            timestamp: Utc::now(),
            amount: bet.amount,
            profit: bet.profit,
            num_games: bet.num_games,
            outcomes: bet.outcomes,
            profits: bet.profits,
            bet_info: bet.bet_info,
            uuid: bet.uuid,
            game_id: bet.game_id,
            user_id: bet.user_id,
            coin_id: bet.coin_id,
            user_seed_id: bet.user_seed_id,
            server_seed_id: bet.server_seed_id,
        };
        tables.bets.push(row.clone());
        Ok(row)
    }

    async fn list_bets(
        &self,
        game_name: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> StorageResult<Vec<BetView>> {
        let tables = self.tables.read().await;
        let matching: Vec<&Bet> = tables
            .bets
            .iter()
            .rev()
            .filter(|bet| {
                game_name
                    .map(|name| tables.games.get(&bet.game_id).map(|g| g.name == name).unwrap_or(false))
                    .unwrap_or(true)
            })
            .collect();
        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|bet| to_view(bet, &tables))
            .collect())
    }

    async fn list_bets_for_user(
        &self,
        user_id: UserId,
        offset: i64,
        limit: i64,
    ) -> StorageResult<Vec<BetView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bets
            .iter()
            .rev()
            .filter(|bet| bet.user_id == user_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|bet| to_view(bet, &tables))
            .collect())
    }

    async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        _window: LeaderboardWindow,
    ) -> StorageResult<Vec<LeaderboardEntry>> {
        // The in-memory fixture has no real wall-clock history to window
        // over, so every window aggregates the full bet log; the Postgres
        // implementation applies the actual time boundary.
        let tables = self.tables.read().await;
        let mut totals: HashMap<UserId, Decimal> = HashMap::new();
        for bet in &tables.bets {
            let Some(coin) = tables.coins.get(&bet.coin_id) else {
                continue;
            };
            if coin.price.is_zero() {
                continue;
            }
            let contribution = match metric {
                LeaderboardMetric::Volume => {
                    (&bet.amount * fairstake_core::decimal::from_u64(bet.num_games as u64)) / &coin.price
                }
                LeaderboardMetric::Profit => &bet.profit / &coin.price,
            };
            let entry = totals.entry(bet.user_id).or_insert_with(zero);
            *entry = entry.clone() + contribution;
        }
        let mut entries: Vec<LeaderboardEntry> = totals
            .into_iter()
            .map(|(user_id, total)| LeaderboardEntry {
                user_id,
                total,
                username: tables
                    .users
                    .get(&user_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
            })
            .collect();
        entries.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap());
        entries.truncate(20);
        Ok(entries)
    }

    async fn insert_refresh_token(&self, token: &str, user_id: UserId) -> StorageResult<()> {
        self.tables
            .write()
            .await
            .refresh_tokens
            .insert(token.to_string(), user_id);
        Ok(())
    }

    async fn revoke_refresh_token(&self, token: &str) -> StorageResult<Option<UserId>> {
        Ok(self.tables.write().await.refresh_tokens.remove(token))
    }

    async fn create_referral_link(
        &self,
        user_id: UserId,
        link_name: &str,
    ) -> StorageResult<ReferralLink> {
        let mut tables = self.tables.write().await;
        let id = self.next();
        let link = ReferralLink {
            id,
            refer_to: user_id,
            link_name: link_name.to_string(),
        };
        tables.referral_links.insert(link_name.to_string(), link.clone());
        Ok(link)
    }

    async fn find_referral_link_by_name(&self, link_name: &str) -> StorageResult<Option<ReferralLink>> {
        Ok(self.tables.read().await.referral_links.get(link_name).cloned())
    }

    async fn create_referral(
        &self,
        refer_to: UserId,
        refer_name: u64,
        referral: UserId,
    ) -> StorageResult<Referral> {
        let mut tables = self.tables.write().await;
        let id = self.next();
        let row = Referral {
            id,
            refer_to,
            refer_name,
            referral,
            created_at: Utc::now(),
        };
        tables.referrals.push(row.clone());
        Ok(row)
    }

    async fn list_referral_links_for_user(&self, user_id: UserId) -> StorageResult<Vec<ReferralLink>> {
        Ok(self
            .tables
            .read()
            .await
            .referral_links
            .values()
            .filter(|link| link.refer_to == user_id)
            .cloned()
            .collect())
    }
}

fn to_view(bet: &Bet, tables: &Tables) -> BetView {
    BetView {
        id: bet.id,
        timestamp: bet.timestamp,
        amount: bet.amount.clone(),
        profit: bet.profit.clone(),
        num_games: bet.num_games,
        outcomes: bet.outcomes.clone(),
        profits: bet.profits.clone(),
        bet_info: bet.bet_info.clone(),
        uuid: bet.uuid.clone(),
        game_id: bet.game_id,
        user_id: bet.user_id,
        username: tables
            .users
            .get(&bet.user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default(),
        coin_id: bet.coin_id,
        user_seed_id: bet.user_seed_id,
        server_seed_id: bet.server_seed_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairstake_core::decimal::dec;

    #[tokio::test]
    async fn decrease_balance_rejects_overdraft() {
        let storage = MemoryStorage::new();
        storage.seed_balance(1, 1, dec("100")).await;
        assert!(storage.decrease_balance(1, 1, &dec("50")).await.is_ok());
        assert!(storage.decrease_balance(1, 1, &dec("1000")).await.is_err());
    }

    #[tokio::test]
    async fn sub_inc_balance_applies_both_legs() {
        let storage = MemoryStorage::new();
        storage.seed_balance(1, 1, dec("100")).await;
        storage
            .sub_inc_balance(1, 1, &dec("30"), &dec("10"))
            .await
            .unwrap();
        let amount = storage.find_amount(1, 1).await.unwrap().unwrap();
        assert_eq!(amount.amount, dec("80"));
    }

    #[tokio::test]
    async fn rotating_server_seed_reveals_prior_ones() {
        let storage = MemoryStorage::new();
        let first = storage.rotate_server_seed(1, "hash-a").await.unwrap();
        let second = storage.rotate_server_seed(1, "hash-b").await.unwrap();
        assert!(!second.revealed);
        let active = storage.active_server_seed(1).await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
        assert_ne!(active.id, first.id);
    }

    #[tokio::test]
    async fn game_state_round_trips() {
        let storage = MemoryStorage::new();
        let inserted = storage
            .insert_game_state(NewGameState {
                game_id: 9,
                user_id: 1,
                coin_id: 1,
                uuid: "abc".into(),
                amount: dec("5"),
                bet_info: "{}".into(),
                state: "{\"step\":0}".into(),
                user_seed_id: 1,
                server_seed_id: 1,
            })
            .await
            .unwrap();
        assert_eq!(inserted.amount, dec("5"));
        storage.update_game_state(9, 1, 1, "{\"step\":1}").await.unwrap();
        let fetched = storage.get_game_state(9, 1, 1).await.unwrap().unwrap();
        assert_eq!(fetched.state, "{\"step\":1}");
        storage.remove_game_state(9, 1, 1).await.unwrap();
        assert!(storage.get_game_state(9, 1, 1).await.unwrap().is_none());
    }
}
