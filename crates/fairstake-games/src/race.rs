use crate::stoploop;
use crate::{parse_data, GameError, GameOutcome, GameResult, OneShotGame, PlayRequest};
use fairstake_core::decimal::zero;
use fairstake_core::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RaceData {
    car: u64,
}

/// Bet on one of `cars_amount` lanes; a fresh winner is drawn per sub-game.
#[derive(Debug, Clone, Deserialize)]
pub struct Race {
    pub profit_coef: Decimal,
    pub cars_amount: u64,
}

impl OneShotGame for Race {
    fn play(&self, request: &PlayRequest, random_numbers: &[u64]) -> GameOutcome<GameResult> {
        let data: RaceData = parse_data(&request.data)?;
        if data.car >= self.cars_amount {
            return Err(GameError::OutOfBounds("car index out of range".into()));
        }
        let profit = &request.amount * &self.profit_coef;

        let result = stoploop::run(
            random_numbers,
            request.num_games,
            &request.stop_win,
            &request.stop_loss,
            |total_profit, total_value, number| {
                let winner = number % self.cars_amount;
                if data.car == winner {
                    let new_total_profit = total_profit + &profit;
                    let new_total_value = &new_total_profit + &profit;
                    (winner, profit.clone(), new_total_profit, new_total_value)
                } else {
                    let new_total_value = total_value - &profit;
                    (winner, zero(), total_profit.clone(), new_total_value)
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
    fn rejects_car_outside_configured_lanes() {
        let game = Race { profit_coef: dec("2"), cars_amount: 4 };
        let request = PlayRequest {
            amount: dec("1"),
            num_games: 1,
            stop_win: zero(),
            stop_loss: zero(),
            data: serde_json::json!({ "car": 7 }).to_string(),
        };
        assert!(game.play(&request, &[1]).is_err());
    }

    #[test]
    fn winning_car_pays_profit_coefficient() {
        let game = Race { profit_coef: dec("3"), cars_amount: 4 };
        let request = PlayRequest {
            amount: dec("10"),
            num_games: 1,
            stop_win: zero(),
            stop_loss: zero(),
            data: serde_json::json!({ "car": 2 }).to_string(),
        };
        let result = game.play(&request, &[2]).unwrap();
        assert_eq!(result.outcomes, vec![2]);
        assert_eq!(result.total_profit, dec("30"));
    }
}
