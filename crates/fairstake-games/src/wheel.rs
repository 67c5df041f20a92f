use crate::stoploop;
use crate::{parse_data, GameError, GameOutcome, GameResult, OneShotGame, PlayRequest};
use fairstake_core::decimal::zero;
use fairstake_core::Decimal;
use num_traits::Zero;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct WheelData {
    risk: u32,
    num_sectors: u32,
}

/// A prize wheel whose sector multipliers are configured per `(risk,
/// num_sectors)` pair; the wheel itself carries `10 * (num_sectors + 1)`
/// virtual sectors so the payout table scales smoothly with sector count.
#[derive(Debug, Clone, Deserialize)]
pub struct Wheel {
    pub multipliers: Vec<Vec<Vec<Decimal>>>,
    pub max_risk: u32,
    pub max_num_sectors: u32,
}

impl OneShotGame for Wheel {
    fn play(&self, request: &PlayRequest, random_numbers: &[u64]) -> GameOutcome<GameResult> {
        let data: WheelData = parse_data(&request.data)?;
        if data.risk > self.max_risk || data.num_sectors > self.max_num_sectors {
            return Err(GameError::OutOfBounds("risk or sector count out of range".into()));
        }

        let table = self
            .multipliers
            .get(data.risk as usize)
            .and_then(|risks| risks.get(data.num_sectors as usize))
            .ok_or_else(|| GameError::OutOfBounds("no multiplier table for this configuration".into()))?;

        let virtual_sectors = ((data.num_sectors + 1) * 10) as u64;

        let result = stoploop::run(
            random_numbers,
            request.num_games,
            &request.stop_win,
            &request.stop_loss,
            |total_profit, total_value, number| {
                let sector = number % virtual_sectors;
                let multiplier = &table[sector as usize];
                if multiplier.is_zero() {
                    let new_total_value = total_value - &request.amount;
                    (sector, zero(), total_profit.clone(), new_total_value)
                } else {
                    let profit = &request.amount * multiplier;
                    let new_total_profit = total_profit + &profit;
                    let new_total_value = &new_total_profit + &profit;
                    (sector, profit, new_total_profit, new_total_value)
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

    fn wheel() -> Wheel {
        // risk 0, num_sectors 0 -> 10 virtual sectors.
        Wheel {
            multipliers: vec![vec![(0..10).map(|_| dec("2")).collect()]],
            max_risk: 0,
            max_num_sectors: 0,
        }
    }

    #[test]
    fn zero_multiplier_sector_loses() {
        let mut g = wheel();
        g.multipliers[0][0][3] = zero();
        let request = PlayRequest {
            amount: dec("5"),
            num_games: 1,
            stop_win: zero(),
            stop_loss: zero(),
            data: serde_json::json!({ "risk": 0, "num_sectors": 0 }).to_string(),
        };
        let result = g.play(&request, &[3]).unwrap();
        assert_eq!(result.total_profit, zero());
    }

    #[test]
    fn rejects_risk_above_configured_max() {
        let g = wheel();
        let request = PlayRequest {
            amount: dec("5"),
            num_games: 1,
            stop_win: zero(),
            stop_loss: zero(),
            data: serde_json::json!({ "risk": 5, "num_sectors": 0 }).to_string(),
        };
        assert!(g.play(&request, &[1]).is_err());
    }
}
