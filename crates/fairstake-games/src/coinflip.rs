use crate::stoploop;
use crate::{parse_data, GameOutcome, GameResult, OneShotGame, PlayRequest};
use fairstake_core::decimal::zero;
use fairstake_core::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct CoinFlipData {
    is_heads: bool,
}

/// Call heads or tails against a fresh coin toss per sub-game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinFlip {
    pub profit_coef: Decimal,
}

impl OneShotGame for CoinFlip {
    fn play(&self, request: &PlayRequest, random_numbers: &[u64]) -> GameOutcome<GameResult> {
        let data: CoinFlipData = parse_data(&request.data)?;
        let profit = &request.amount * &self.profit_coef;

        let result = stoploop::run(
            random_numbers,
            request.num_games,
            &request.stop_win,
            &request.stop_loss,
            |total_profit, total_value, number| {
                let side = number % 2;
                let won = (data.is_heads && side == 1) || (!data.is_heads && side == 0);
                if won {
                    let new_total_profit = total_profit + &profit;
                    let new_total_value = &new_total_profit + &profit;
                    (side, profit.clone(), new_total_profit, new_total_value)
                } else {
                    let new_total_value = total_value - &profit;
                    (side, zero(), total_profit.clone(), new_total_value)
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
    use fairstake_core::decimal::{dec, from_u64};

    fn request(is_heads: bool, num_games: u64) -> PlayRequest {
        PlayRequest {
            amount: dec("10"),
            num_games,
            stop_win: zero(),
            stop_loss: zero(),
            data: serde_json::json!({ "is_heads": is_heads }).to_string(),
        }
    }

    #[test]
    fn win_credits_profit_coefficient() {
        let game = CoinFlip { profit_coef: dec("2") };
        let result = game.play(&request(true, 1), &[1]).unwrap();
        assert_eq!(result.outcomes, vec![1]);
        assert_eq!(result.total_profit, dec("20"));
        assert_eq!(result.num_games, 1);
    }

    #[test]
    fn loss_pays_nothing() {
        let game = CoinFlip { profit_coef: dec("2") };
        let result = game.play(&request(true, 1), &[2]).unwrap();
        assert_eq!(result.outcomes, vec![0]);
        assert_eq!(result.total_profit, zero());
    }

    #[test]
    fn unplayed_sub_games_refund_as_raw_units() {
        let game = CoinFlip { profit_coef: dec("2") };
        let request = PlayRequest {
            stop_loss: dec("-1"),
            ..request(true, 5)
        };
        let result = game.play(&request, &[2, 2, 2, 2, 2]).unwrap();
        assert_eq!(result.num_games, 1);
        assert_eq!(result.total_profit, from_u64(4));
    }
}
