use crate::{parse_data, GameError, GameOutcome, GameResult, OneShotGame, PlayRequest};
use fairstake_core::decimal::{from_u64, zero};
use fairstake_core::Decimal;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct PlinkoData {
    num_rows: u64,
    risk: u64,
}

#[derive(Debug, Serialize)]
struct PlinkoReturnData {
    num_rows: u64,
    risk: u64,
    paths: Vec<Vec<u8>>,
}

/// A ball dropped through `num_rows` pin rows, walking left or right on
/// each row according to one bit of the draw; lands in a slot whose
/// multiplier is read straight from the configured payout table.
#[derive(Debug, Clone, Deserialize)]
pub struct Plinko {
    /// `[risk][num_rows - 8][slot]`.
    pub multipliers: Vec<Vec<Vec<Decimal>>>,
}

impl Plinko {
    fn drop_ball(&self, rng: u64, num_rows: u64, risk: u64) -> (Decimal, Vec<u8>) {
        let mut path = Vec::with_capacity(num_rows as usize);
        let mut mask: u64 = 0x8000_0000_0000_0000;
        let mut ended: i64 = 0;

        for _ in 0..num_rows {
            let bit = if rng & mask > 0 {
                ended += 1;
                1
            } else {
                ended -= 1;
                0
            };
            path.push(bit);
            mask >>= 1;
        }

        let slot = ((ended + num_rows as i64) >> 1) as usize;
        let multiplier = self.multipliers[risk as usize][(num_rows - 8) as usize][slot].clone();
        (multiplier, path)
    }
}

impl OneShotGame for Plinko {
    fn play(&self, request: &PlayRequest, random_numbers: &[u64]) -> GameOutcome<GameResult> {
        let data: PlinkoData = parse_data(&request.data)?;
        if !(8..=16).contains(&data.num_rows) {
            return Err(GameError::OutOfBounds("num_rows must be between 8 and 16".into()));
        }
        if data.risk >= 3 {
            return Err(GameError::OutOfBounds("risk must be 0, 1 or 2".into()));
        }

        let mut total_profit = zero();
        let mut total_value = zero();
        let mut outcomes = Vec::with_capacity(random_numbers.len());
        let mut profits = Vec::with_capacity(random_numbers.len());
        let mut paths = Vec::with_capacity(random_numbers.len());
        let mut games_played = 0u64;

        for &number in random_numbers {
            let (multiplier, path) = self.drop_ball(number, data.num_rows, data.risk);
            let payout = &request.amount * &multiplier;

            paths.push(path);
            outcomes.push(number);
            profits.push(payout.clone());
            games_played += 1;

            total_profit = total_profit + &payout;
            total_value = total_value + (&payout - &request.amount);

            let stopped_on_win = !request.stop_win.is_zero() && total_value >= request.stop_win;
            let stopped_on_loss = !request.stop_loss.is_zero() && total_value <= request.stop_loss;
            if stopped_on_win || stopped_on_loss {
                break;
            }
        }

        if games_played != request.num_games {
            total_profit = total_profit + from_u64(request.num_games - games_played);
        }

        let return_data = PlinkoReturnData {
            num_rows: data.num_rows,
            risk: data.risk,
            paths,
        };
        let encoded = serde_json::to_string(&return_data)
            .map_err(|e| GameError::MalformedData(e.to_string()))?;

        Ok(GameResult {
            total_profit,
            outcomes,
            profits,
            num_games: games_played as u32,
            data: encoded,
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

    fn plinko_8_rows() -> Plinko {
        Plinko {
            multipliers: vec![vec![(0..=8).map(|_| dec("1.5")).collect()]],
        }
    }

    #[test]
    fn all_right_lands_in_last_slot() {
        let g = plinko_8_rows();
        let (multiplier, path) = g.drop_ball(u64::MAX, 8, 0);
        assert_eq!(path, vec![1; 8]);
        assert_eq!(multiplier, dec("1.5"));
    }

    #[test]
    fn all_left_lands_in_first_slot() {
        let g = plinko_8_rows();
        let (_multiplier, path) = g.drop_ball(0, 8, 0);
        assert_eq!(path, vec![0; 8]);
    }

    #[test]
    fn rejects_row_count_outside_range() {
        let g = plinko_8_rows();
        let request = PlayRequest {
            amount: dec("1"),
            num_games: 1,
            stop_win: zero(),
            stop_loss: zero(),
            data: serde_json::json!({ "num_rows": 20, "risk": 0 }).to_string(),
        };
        assert!(g.play(&request, &[1]).is_err());
    }
}
