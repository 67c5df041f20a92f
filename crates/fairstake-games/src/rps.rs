use crate::stoploop;
use crate::{parse_data, GameError, GameOutcome, GameResult, OneShotGame, PlayRequest};
use fairstake_core::decimal::zero;
use fairstake_core::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RpsData {
    /// 0 rock, 1 paper, 2 scissors.
    action: u64,
}

/// Outcome of the player's hand against the house's: 2 draw, 1 win, 0 loss.
fn judge(player: u64, house: u64) -> u32 {
    if player == house {
        return 2;
    }
    let beats = matches!((player, house), (0, 2) | (1, 0) | (2, 1));
    if beats {
        1
    } else {
        0
    }
}

/// Rock, paper, scissors against a house hand drawn per sub-game.
#[derive(Debug, Clone, Deserialize)]
pub struct Rps {
    pub profit_coef: Decimal,
    pub draw_coef: Decimal,
}

impl OneShotGame for Rps {
    fn play(&self, request: &PlayRequest, random_numbers: &[u64]) -> GameOutcome<GameResult> {
        let data: RpsData = parse_data(&request.data)?;
        if data.action > 2 {
            return Err(GameError::OutOfBounds("action must be 0, 1 or 2".into()));
        }
        let profit = &request.amount * &self.profit_coef;
        let draw = &request.amount * &self.draw_coef;

        let result = stoploop::run(
            random_numbers,
            request.num_games,
            &request.stop_win,
            &request.stop_loss,
            |total_profit, total_value, number| {
                let house = number % 3;
                match judge(data.action, house) {
                    2 => {
                        let new_total_profit = total_profit + &draw;
                        let new_total_value = &new_total_profit + &draw;
                        (house, draw.clone(), new_total_profit, new_total_value)
                    }
                    1 => {
                        let new_total_profit = total_profit + &profit;
                        let new_total_value = &new_total_profit + &profit;
                        (house, profit.clone(), new_total_profit, new_total_value)
                    }
                    _ => {
                        let new_total_value = total_value - &profit;
                        (house, zero(), total_profit.clone(), new_total_value)
                    }
                }
            },
        );

        Ok(GameResult {
            total_profit: result.total_profit,
            outcomes: result.outcomes,
            profits: result.profits,
            num_games: result.games_played as u32,
            data: request.data.clone(),
            finished: true,
        })
    }

    fn numbers_per_bet(&self) -> u64 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn judge_covers_all_combinations() {
        assert_eq!(judge(0, 0), 2);
        assert_eq!(judge(0, 1), 0); // paper beats rock
        assert_eq!(judge(0, 2), 1); // rock beats scissors
        assert_eq!(judge(1, 2), 0); // scissors beats paper
        assert_eq!(judge(2, 0), 0); // rock beats scissors
        assert_eq!(judge(2, 1), 1); // scissors beats paper
    }

    #[test]
    fn draw_pays_draw_coefficient() {
        let game = Rps { profit_coef: fairstake_core::decimal::dec("2"), draw_coef: fairstake_core::decimal::dec("1") };
        let request = PlayRequest {
            amount: fairstake_core::decimal::dec("10"),
            num_games: 1,
            stop_win: zero(),
            stop_loss: zero(),
            data: serde_json::json!({ "action": 0 }).to_string(),
        };
        let result = game.play(&request, &[0]).unwrap();
        assert_eq!(result.total_profit, fairstake_core::decimal::dec("10"));
    }
}
