use crate::{
    parse_data, ContinueRequest, GameError, GameOutcome, GameResult, MultiStepGame, OpenState,
    PlayRequest,
};
use fairstake_core::decimal::zero;
use num_traits::Zero;
use fairstake_core::Decimal;
use serde::{Deserialize, Serialize};

/// One configured difficulty tier: how many mines sit in each row and how
/// wide the row is.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ApplesDifficulty {
    pub mines: u8,
    pub total_spaces: u8,
}

#[derive(Debug, Deserialize)]
struct ApplesData {
    difficulty: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApplesState {
    state: Vec<Vec<bool>>,
    picked_tiles: Vec<u8>,
    current_multiplier: Decimal,
}

#[derive(Debug, Deserialize)]
struct ApplesContinueData {
    tile: u8,
    cashout: bool,
}

/// A mine-sweep ladder: each of 9 rows hides one or more mines in a
/// configurable number of tiles; pick a safe tile to climb the payout
/// ladder, or cash out at the current multiplier.
#[derive(Debug, Clone, Deserialize)]
pub struct Apples {
    pub difficulties: Vec<ApplesDifficulty>,
    /// `[difficulty][row_index]`.
    pub multipliers: Vec<Vec<Decimal>>,
}

impl MultiStepGame for Apples {
    fn start(&self, request: &PlayRequest, _random_numbers: &[u64]) -> GameOutcome<GameResult> {
        let data: ApplesData = parse_data(&request.data)?;
        if data.difficulty as usize >= self.difficulties.len() {
            return Err(GameError::OutOfBounds("unknown difficulty".into()));
        }

        let state = ApplesState {
            state: vec![],
            picked_tiles: vec![],
            current_multiplier: zero(),
        };
        let encoded = serde_json::to_string(&state).map_err(|e| GameError::MalformedData(e.to_string()))?;

        Ok(GameResult {
            total_profit: zero(),
            outcomes: vec![],
            profits: vec![],
            num_games: 1,
            data: encoded,
            finished: false,
        })
    }

    fn continue_game(
        &self,
        state: &OpenState,
        step: &ContinueRequest,
        random_numbers: &[u64],
    ) -> GameOutcome<GameResult> {
        let data: ApplesContinueData = parse_data(&step.data)?;
        let mut parsed: ApplesState = parse_data(&state.state)?;
        let initial: ApplesData = parse_data(&state.bet_info)?;

        if data.cashout && !parsed.current_multiplier.is_zero() {
            let profit = &state.amount * &parsed.current_multiplier;
            return Ok(GameResult {
                total_profit: profit.clone(),
                outcomes: vec![0; parsed.state.len()],
                profits: vec![profit],
                num_games: 1,
                data: state.state.clone(),
                finished: true,
            });
        }

        let difficulty = self
            .difficulties
            .get(initial.difficulty as usize)
            .ok_or_else(|| GameError::OutOfBounds("unknown difficulty".into()))?;

        if data.tile >= difficulty.total_spaces {
            return Err(GameError::OutOfBounds("picked tile is out of range".into()));
        }

        let mut row = vec![false; difficulty.total_spaces as usize];
        let rng = random_numbers[0];

        if difficulty.mines == 1 {
            let mine_index = (rng % difficulty.total_spaces as u64) as usize;
            row[mine_index] = true;
        } else {
            row.iter_mut().for_each(|tile| *tile = true);
            let empty_index = (rng % difficulty.total_spaces as u64) as usize;
            row[empty_index] = false;
        }

        let won = !row[data.tile as usize];
        parsed.state.push(row);
        parsed.picked_tiles.push(data.tile);

        if won {
            let row_index = parsed.state.len() - 1;
            let multiplier = self.multipliers[initial.difficulty as usize][row_index].clone();
            parsed.current_multiplier = multiplier.clone();
            let profit = &state.amount * &multiplier;
            let finished = parsed.state.len() == 9;
            let encoded = serde_json::to_string(&parsed).map_err(|e| GameError::MalformedData(e.to_string()))?;

            Ok(GameResult {
                total_profit: profit.clone(),
                outcomes: vec![0; parsed.state.len()],
                profits: vec![profit],
                num_games: 1,
                data: encoded,
                finished,
            })
        } else {
            parsed.current_multiplier = zero();
            let rows_so_far = vec![0u64; parsed.state.len()];
            let encoded = serde_json::to_string(&parsed).map_err(|e| GameError::MalformedData(e.to_string()))?;

            Ok(GameResult {
                total_profit: zero(),
                outcomes: rows_so_far,
                profits: vec![zero()],
                num_games: 1,
                data: encoded,
                finished: true,
            })
        }
    }

    fn numbers_per_bet(&self) -> u64 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairstake_core::decimal::dec;

    fn apples() -> Apples {
        Apples {
            difficulties: vec![ApplesDifficulty { mines: 1, total_spaces: 3 }],
            multipliers: vec![vec![dec("1.1"); 9]],
        }
    }

    #[test]
    fn picking_the_mine_ends_the_run() {
        let game = apples();
        let state = OpenState {
            amount: dec("10"),
            bet_info: serde_json::json!({ "difficulty": 0 }).to_string(),
            state: serde_json::json!({ "state": [], "picked_tiles": [], "current_multiplier": "0" }).to_string(),
        };
        // rng % 3 == 0 -> mine at index 0, player picks tile 0 -> loses.
        let result = game.continue_game(&state, &ContinueRequest { data: serde_json::json!({ "tile": 0, "cashout": false }).to_string() }, &[3]).unwrap();
        assert!(result.finished);
        assert_eq!(result.total_profit, zero());
    }

    #[test]
    fn safe_tile_advances_multiplier() {
        let game = apples();
        let state = OpenState {
            amount: dec("10"),
            bet_info: serde_json::json!({ "difficulty": 0 }).to_string(),
            state: serde_json::json!({ "state": [], "picked_tiles": [], "current_multiplier": "0" }).to_string(),
        };
        // rng % 3 == 0 -> mine at index 0, player picks tile 1 -> survives.
        let result = game.continue_game(&state, &ContinueRequest { data: serde_json::json!({ "tile": 1, "cashout": false }).to_string() }, &[3]).unwrap();
        assert!(!result.finished);
        assert_eq!(result.total_profit, dec("11.0"));
    }

    #[test]
    fn cashout_with_zero_multiplier_is_rejected_as_another_pick() {
        let game = apples();
        let state = OpenState {
            amount: dec("10"),
            bet_info: serde_json::json!({ "difficulty": 0 }).to_string(),
            state: serde_json::json!({ "state": [], "picked_tiles": [], "current_multiplier": "0" }).to_string(),
        };
        let result = game.continue_game(&state, &ContinueRequest { data: serde_json::json!({ "tile": 1, "cashout": true }).to_string() }, &[3]).unwrap();
        // current_multiplier is zero before any pick, so cashout falls through to a normal pick.
        assert!(!result.finished);
    }
}
