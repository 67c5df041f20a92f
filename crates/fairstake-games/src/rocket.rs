use crate::dice::{lower_boundary, roll, threshold_for, upper_boundary};
use crate::stoploop;
use crate::{parse_data, GameError, GameOutcome, GameResult, OneShotGame, PlayRequest};
use fairstake_core::decimal::zero;
use fairstake_core::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RocketData {
    multiplier: Decimal,
}

/// Dice with the roll direction pinned to "over" — the crash-game framing
/// of the same continuous roll.
#[derive(Debug, Clone)]
pub struct Rocket;

impl OneShotGame for Rocket {
    fn play(&self, request: &PlayRequest, random_numbers: &[u64]) -> GameOutcome<GameResult> {
        let data: RocketData = parse_data(&request.data)?;
        if data.multiplier < lower_boundary() || data.multiplier > upper_boundary() {
            return Err(GameError::OutOfBounds("multiplier out of bounds".into()));
        }

        let profit = &request.amount * &data.multiplier;
        let threshold = threshold_for(&data.multiplier);

        let result = stoploop::run(
            random_numbers,
            request.num_games,
            &request.stop_win,
            &request.stop_loss,
            |total_profit, total_value, number| {
                let (remapped, outcome) = roll(number);
                if remapped >= threshold {
                    let new_total_profit = total_profit + &profit;
                    let new_total_value = total_value + &profit;
                    (outcome, profit.clone(), new_total_profit, new_total_value)
                } else {
                    let new_total_value = total_value - &request.amount;
                    (outcome, zero(), total_profit.clone(), new_total_value)
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
    use fairstake_core::decimal::dec;

    #[test]
    fn roll_over_is_always_on() {
        let game = Rocket;
        let request = PlayRequest {
            amount: dec("10"),
            num_games: 1,
            stop_win: zero(),
            stop_loss: zero(),
            data: serde_json::json!({ "multiplier": "2" }).to_string(),
        };
        let result = game.play(&request, &[u64::MAX]).unwrap();
        assert_eq!(result.total_profit, dec("20"));
    }
}
