//! The stop-win/stop-loss sub-game loop shared by every one-shot game.
//!
//! Each game supplies a `step` closure that, given the running totals and
//! the next random number, produces this sub-game's outcome tag, its
//! profit contribution, and the *new* running profit and running value.
//! Running value is what the stop rule checks against; it is not always
//! the same quantity as running profit — several games fold a sub-game's
//! profit into the running value using the same addition they use for
//! running profit rather than an increment, and that quirk is preserved
//! here exactly as each `step` closure expresses it rather than
//! normalised away by this loop.

use fairstake_core::decimal::{from_u64, zero};
use fairstake_core::Decimal;
use num_traits::Zero;

pub struct LoopResult {
    pub total_profit: Decimal,
    pub outcomes: Vec<u64>,
    pub profits: Vec<Decimal>,
    pub games_played: u64,
}

pub fn run<F>(
    random_numbers: &[u64],
    requested_games: u64,
    stop_win: &Decimal,
    stop_loss: &Decimal,
    mut step: F,
) -> LoopResult
where
    F: FnMut(&Decimal, &Decimal, u64) -> (u64, Decimal, Decimal, Decimal),
{
    let mut total_profit = zero();
    let mut total_value = zero();
    let mut outcomes = Vec::with_capacity(random_numbers.len());
    let mut profits = Vec::with_capacity(random_numbers.len());
    let mut games_played = 0u64;

    for &number in random_numbers {
        let (outcome, profit_slot, new_total_profit, new_total_value) =
            step(&total_profit, &total_value, number);

        outcomes.push(outcome);
        profits.push(profit_slot);
        total_profit = new_total_profit;
        total_value = new_total_value;
        games_played += 1;

        let stopped_on_win = !stop_win.is_zero() && total_value >= *stop_win;
        let stopped_on_loss = !stop_loss.is_zero() && total_value <= *stop_loss;
        if stopped_on_win || stopped_on_loss {
            break;
        }
    }

    if games_played != requested_games {
        total_profit = total_profit + from_u64(requested_games - games_played);
    }

    LoopResult {
        total_profit,
        outcomes,
        profits,
        games_played,
    }
}
