use crate::stoploop;
use crate::{parse_data, GameError, GameOutcome, GameResult, OneShotGame, PlayRequest};
use fairstake_core::decimal::{dec, from_u64, remap, zero};
use fairstake_core::Decimal;
use serde::Deserialize;

pub(crate) fn lower_boundary() -> Decimal {
    dec("1.0421")
}
pub(crate) fn upper_boundary() -> Decimal {
    dec("99.9999")
}
fn mult() -> Decimal {
    dec("10000")
}
fn u64_upper_boundary() -> Decimal {
    dec("18446744073709551615")
}
fn hundred() -> Decimal {
    dec("100")
}
fn ninety_nine() -> Decimal {
    dec("99")
}

/// Remaps a raw random 64-bit word onto the dice's `[1.0421, 99.9999]`
/// roll range and returns both the exact remapped value and its recorded
/// `x10000` integer outcome.
pub(crate) fn roll(number: u64) -> (Decimal, u64) {
    let remapped = remap(
        &from_u64(number),
        &zero(),
        &u64_upper_boundary(),
        &lower_boundary(),
        &upper_boundary(),
    );
    let scaled = &remapped * mult();
    let outcome = scaled.with_scale(0).to_string().parse::<u64>().unwrap_or(0);
    (remapped, outcome)
}

pub(crate) fn threshold_for(multiplier: &Decimal) -> Decimal {
    hundred() - ninety_nine() / multiplier
}

#[derive(Debug, Deserialize)]
struct DiceData {
    roll_over: bool,
    multiplier: Decimal,
}

/// Roll under or over a player-chosen multiplier on a continuous `[1.0421,
/// 99.9999]` scale.
#[derive(Debug, Clone)]
pub struct Dice;

impl OneShotGame for Dice {
    fn play(&self, request: &PlayRequest, random_numbers: &[u64]) -> GameOutcome<GameResult> {
        let data: DiceData = parse_data(&request.data)?;
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
                let won = (data.roll_over && remapped >= threshold)
                    || (!data.roll_over && threshold >= remapped);
                if won {
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

    #[test]
    fn roll_stays_within_outcome_range() {
        for number in [0u64, u64::MAX / 2, u64::MAX] {
            let (remapped, outcome) = roll(number);
            assert!(remapped >= lower_boundary() && remapped <= upper_boundary());
            assert!(outcome >= 10421 && outcome <= 999_999);
        }
    }

    #[test]
    fn rejects_out_of_bounds_multiplier() {
        let game = Dice;
        let request = PlayRequest {
            amount: dec("1"),
            num_games: 1,
            stop_win: zero(),
            stop_loss: zero(),
            data: serde_json::json!({ "roll_over": true, "multiplier": "200" }).to_string(),
        };
        assert!(game.play(&request, &[1]).is_err());
    }

    #[test]
    fn roll_over_wins_on_high_draw() {
        let game = Dice;
        let request = PlayRequest {
            amount: dec("10"),
            num_games: 1,
            stop_win: zero(),
            stop_loss: zero(),
            data: serde_json::json!({ "roll_over": true, "multiplier": "2" }).to_string(),
        };
        let result = game.play(&request, &[u64::MAX]).unwrap();
        assert_eq!(result.total_profit, dec("20"));
    }
}
