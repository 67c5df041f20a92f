//! The relational data model (§3): identities, balances, seeds and the
//! immutable wager log. Every row type here is storage-agnostic — it
//! derives `Serialize`/`Deserialize` for wire use and is mapped to concrete
//! columns by `fairstake-storage`, never the other way around.

use crate::decimal::Decimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type CoinId = u64;
pub type GameId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Local,
    Google,
    Facebook,
    Twitter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub registration_time: DateTime<Utc>,
    pub login: String,
    pub username: String,
    /// Hex-encoded BLAKE2b-256 of `password || salt`. Never the plaintext.
    pub password_hash: String,
    pub provider: AuthProvider,
    pub user_level: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub id: CoinId,
    pub name: String,
    /// Price in a common reference unit; must stay strictly positive.
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amount {
    pub user_id: UserId,
    pub coin_id: CoinId,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSeed {
    pub id: u64,
    pub user_id: UserId,
    pub user_seed: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSeed {
    pub id: u64,
    pub user_id: UserId,
    pub server_seed: String,
    pub revealed: bool,
    pub created_at: DateTime<Utc>,
}

/// A loaded game variant: an id, a display name, and the raw JSON parameter
/// blob the matching entry in the game catalogue deserialises itself from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRow {
    pub id: GameId,
    pub name: String,
    pub parameters: String,
}

/// An immutable settled wager, written exactly once after a wager terminates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub amount: Decimal,
    pub profit: Decimal,
    pub num_games: u32,
    /// JSON-encoded `Vec<u64>`.
    pub outcomes: String,
    /// JSON-encoded `Vec<Decimal>`.
    pub profits: String,
    /// The raw client-submitted `data` blob for this wager/step.
    pub bet_info: String,
    pub uuid: String,
    pub game_id: GameId,
    pub user_id: UserId,
    pub coin_id: CoinId,
    pub user_seed_id: u64,
    pub server_seed_id: u64,
}

/// A settled `Bet` enriched with the resolving username, as broadcast to
/// subscribers (it never touches storage in this shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetView {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub amount: Decimal,
    pub profit: Decimal,
    pub num_games: u32,
    pub outcomes: String,
    pub profits: String,
    pub bet_info: String,
    pub uuid: String,
    pub game_id: GameId,
    pub user_id: UserId,
    pub username: String,
    pub coin_id: CoinId,
    pub user_seed_id: u64,
    pub server_seed_id: u64,
}

/// The live interim record for a multi-step game. At most one per
/// `(game_id, user_id, coin_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    /// The stake this game was started with (one sub-game's worth).
    pub amount: Decimal,
    pub bet_info: String,
    /// Game-specific encoded interim state, opaque to the engine.
    pub state: String,
    pub uuid: String,
    pub game_id: GameId,
    pub user_id: UserId,
    pub coin_id: CoinId,
    pub user_seed_id: u64,
    pub server_seed_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralLink {
    pub id: u64,
    pub refer_to: UserId,
    pub link_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    pub id: u64,
    pub refer_to: UserId,
    pub refer_name: u64,
    pub referral: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub total: Decimal,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardMetric {
    Volume,
    Profit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardWindow {
    Daily,
    Weekly,
    Monthly,
    All,
}
