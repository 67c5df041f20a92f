use fairstake_core::model::{CoinId, GameId, UserId};
use fairstake_core::Decimal;

/// A fresh wager submission, whether it settles in one shot or opens a
/// multi-step game.
#[derive(Debug, Clone)]
pub struct BetRequest {
    pub amount: Decimal,
    pub num_games: u64,
    pub uuid: String,
    pub data: String,
    pub game_id: GameId,
    pub user_id: UserId,
    pub coin_id: CoinId,
    pub stop_loss: Decimal,
    pub stop_win: Decimal,
}

/// A further step submitted against an already-open multi-step wager.
#[derive(Debug, Clone)]
pub struct ContinueGameRequest {
    pub uuid: String,
    pub data: String,
    pub game_id: GameId,
    pub user_id: UserId,
    pub coin_id: CoinId,
}

/// What the one-shot engine's single input channel carries. A session
/// normally only ever sends `PlaceBet`; `ContinueGame` exists so the
/// engine can be handed a misrouted continuation and forward it on rather
/// than reject it outright.
#[derive(Debug, Clone)]
pub enum StatelessInput {
    PlaceBet(BetRequest),
    ContinueGame(ContinueGameRequest),
}

/// What the multi-step engine's single input channel carries.
#[derive(Debug, Clone)]
pub enum StatefulInput {
    StartGame(BetRequest),
    ContinueGame(ContinueGameRequest),
}
