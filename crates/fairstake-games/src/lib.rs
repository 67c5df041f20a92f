//! The game catalogue (component B): one outcome function per wager type,
//! plus the two capability shapes the engine dispatches against.
//!
//! Every game is either a [`OneShotGame`] — it consumes its whole random
//! number stream in a single call and always finishes — or a
//! [`MultiStepGame`] — it starts with an opening draw and is advanced one
//! player decision at a time until it finishes. Both shapes report results
//! through the same [`GameResult`].

mod apples;
mod coinflip;
mod dice;
mod plinko;
mod poker;
mod race;
mod rocket;
mod rps;
mod stoploop;
mod wheel;

pub use apples::{Apples, ApplesDifficulty};
pub use coinflip::CoinFlip;
pub use dice::Dice;
pub use plinko::Plinko;
pub use poker::{Card, Poker};
pub use race::Race;
pub use rocket::Rocket;
pub use rps::Rps;
pub use wheel::Wheel;

use fairstake_core::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything an outcome function needs to settle a fresh one-shot wager,
/// or open a multi-step one.
#[derive(Debug, Clone)]
pub struct PlayRequest {
    pub amount: Decimal,
    pub num_games: u64,
    pub stop_win: Decimal,
    pub stop_loss: Decimal,
    /// The raw client-submitted parameter blob for this game (JSON text).
    pub data: String,
}

/// A single step submitted against an open multi-step wager.
#[derive(Debug, Clone)]
pub struct ContinueRequest {
    pub data: String,
}

/// The prior interim state of an open multi-step wager, as persisted by
/// storage and handed back to the game that produced it.
#[derive(Debug, Clone)]
pub struct OpenState {
    pub amount: Decimal,
    pub bet_info: String,
    pub state: String,
}

/// The outcome of running a game, whether fully settled or still open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub total_profit: Decimal,
    pub outcomes: Vec<u64>,
    pub profits: Vec<Decimal>,
    pub num_games: u32,
    /// Opaque — the client-facing parameter echo on a finished one-shot
    /// result, or serialised interim state on an open multi-step result.
    pub data: String,
    pub finished: bool,
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("malformed game data: {0}")]
    MalformedData(String),
    #[error("value out of bounds: {0}")]
    OutOfBounds(String),
    #[error("invalid interim state: {0}")]
    InvalidState(String),
}

pub type GameOutcome<T> = Result<T, GameError>;

/// A wager settled entirely from one call against the full random number
/// stream: CoinFlip, Dice, Rocket, Race, RPS, Wheel, Plinko.
pub trait OneShotGame {
    fn play(&self, request: &PlayRequest, random_numbers: &[u64]) -> GameOutcome<GameResult>;
    fn numbers_per_bet(&self) -> u64;
}

/// A wager opened with one call and advanced with further calls until it
/// reports `finished`: Poker, Apples.
pub trait MultiStepGame {
    fn start(&self, request: &PlayRequest, random_numbers: &[u64]) -> GameOutcome<GameResult>;
    fn continue_game(
        &self,
        state: &OpenState,
        step: &ContinueRequest,
        random_numbers: &[u64],
    ) -> GameOutcome<GameResult>;
    fn numbers_per_bet(&self) -> u64;
}

fn parse_data<T: for<'de> Deserialize<'de>>(data: &str) -> GameOutcome<T> {
    serde_json::from_str(data).map_err(|e| GameError::MalformedData(e.to_string()))
}
