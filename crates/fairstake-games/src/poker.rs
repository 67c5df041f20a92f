use crate::{
    parse_data, ContinueRequest, GameError, GameOutcome, GameResult, MultiStepGame, OpenState,
    PlayRequest,
};
use fairstake_core::decimal::{dec, zero};
use fairstake_core::Decimal;
use serde::{Deserialize, Serialize};

/// A single playing card: `number` is `1..=13` (ace low), `suit` is `0..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub number: u8,
    pub suit: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PokerState {
    cards_in_hand: Vec<Card>,
}

#[derive(Debug, Deserialize)]
struct PokerContinueData {
    replace: bool,
    #[serde(default)]
    to_replace: Vec<bool>,
}

/// Five-card draw poker: open with five cards, optionally swap any subset
/// once, then pay out against a fixed hand-ranking table.
#[derive(Debug, Clone, Deserialize)]
pub struct Poker {
    pub initial_deck: Vec<Card>,
}

fn pick_card(rng: u64, deck: &mut Vec<Card>) -> Card {
    let position = (rng % deck.len() as u64) as usize;
    deck.swap_remove(position)
}

fn remove_card(card: Card, deck: &mut Vec<Card>) {
    if let Some(index) = deck.iter().position(|c| *c == card) {
        deck.swap_remove(index);
    }
}

impl MultiStepGame for Poker {
    fn start(&self, request: &PlayRequest, random_numbers: &[u64]) -> GameOutcome<GameResult> {
        let mut deck = self.initial_deck.clone();
        let mut cards_in_hand = Vec::with_capacity(5);
        for &number in random_numbers.iter().take(5) {
            cards_in_hand.push(pick_card(number, &mut deck));
        }

        let state = PokerState { cards_in_hand };
        let encoded = serde_json::to_string(&state).map_err(|e| GameError::MalformedData(e.to_string()))?;

        Ok(GameResult {
            total_profit: zero(),
            outcomes: random_numbers.to_vec(),
            profits: vec![zero()],
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
        let data: PokerContinueData = parse_data(&step.data)?;
        let mut parsed: PokerState = parse_data(&state.state)?;

        if data.replace && data.to_replace.len() != 5 {
            return Err(GameError::MalformedData("to_replace must have 5 entries".into()));
        }

        if data.replace {
            let mut deck = self.initial_deck.clone();
            for (i, card) in parsed.cards_in_hand.iter().enumerate() {
                if !data.to_replace[i] {
                    remove_card(*card, &mut deck);
                }
            }
            for (i, &number) in random_numbers.iter().take(5).enumerate() {
                if data.to_replace[i] {
                    parsed.cards_in_hand[i] = pick_card(number, &mut deck);
                }
            }
        }

        let mut sorted_hand = parsed.cards_in_hand.clone();
        let (multiplier, outcome) = determine_payout(&mut sorted_hand);
        let profit = &state.amount * &multiplier;

        let encoded = serde_json::to_string(&parsed).map_err(|e| GameError::MalformedData(e.to_string()))?;

        Ok(GameResult {
            total_profit: profit.clone(),
            outcomes: vec![outcome as u64],
            profits: vec![profit],
            num_games: 1,
            data: encoded,
            finished: true,
        })
    }

    fn numbers_per_bet(&self) -> u64 {
        5
    }
}

/// Scores a 5-card hand by the fixed payout table, sorting it ascending by
/// rank first. Aces sort low (`1`); A-2-3-4-5 and 10-J-Q-K-A both count as
/// straights.
fn determine_payout(cards: &mut [Card]) -> (Decimal, u32) {
    cards.sort_by_key(|c| c.number);
    let n: Vec<u8> = cards.iter().map(|c| c.number).collect();
    let s: Vec<u8> = cards.iter().map(|c| c.suit).collect();

    let adjacent = |a: usize, b: usize| n[a] == n[b];

    if adjacent(1, 2) && adjacent(2, 3) && (adjacent(0, 1) || adjacent(3, 4)) {
        return (dec("30"), 7);
    }

    if adjacent(0, 1) && adjacent(3, 4) && (adjacent(1, 2) || adjacent(2, 3)) {
        return (dec("8"), 6);
    }

    let same_suit = s[0] == s[1] && s[2] == s[3] && s[0] == s[4] && s[2] == s[1];
    let ace_low_run = n[0] == 1 && n[1] == 2 && n[1] == n[2] - 1 && n[2] == n[3] - 1 && n[3] == n[4] - 1;
    let ace_high_run = n[0] == 1 && n[4] == 13 && n[1] == n[2] - 1 && n[2] == n[3] - 1 && n[3] == n[4] - 1;
    let plain_run = n[0] == n[1] - 1 && n[1] == n[2] - 1 && n[2] == n[3] - 1 && n[3] == n[4] - 1;

    if same_suit {
        if ace_high_run {
            return (dec("100"), 9);
        }
        if ace_low_run || plain_run {
            return (dec("50"), 8);
        }
        return (dec("6"), 5);
    }

    if ace_low_run || ace_high_run || plain_run {
        return (dec("5"), 4);
    }

    if adjacent(0, 1) && adjacent(1, 2) {
        return (dec("3"), 3);
    }
    if adjacent(1, 2) && adjacent(2, 3) {
        return (dec("3"), 3);
    }
    if adjacent(2, 3) && adjacent(3, 4) {
        return (dec("3"), 3);
    }

    if adjacent(0, 1) && (adjacent(2, 3) || adjacent(3, 4)) {
        return (dec("2"), 2);
    }
    if adjacent(1, 2) && adjacent(3, 4) {
        return (dec("2"), 2);
    }

    let jacks_or_better = |idx: usize| n[idx] > 10 || n[idx] == 1;
    if adjacent(0, 1) && jacks_or_better(0) {
        return (dec("1"), 1);
    }
    if adjacent(1, 2) && jacks_or_better(1) {
        return (dec("1"), 1);
    }
    if adjacent(2, 3) && jacks_or_better(2) {
        return (dec("1"), 1);
    }
    if adjacent(3, 4) && jacks_or_better(3) {
        return (dec("1"), 1);
    }

    (zero(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: u8, suit: u8) -> Card {
        Card { number, suit }
    }

    #[test]
    fn royal_flush_scores_highest() {
        let mut hand = vec![card(1, 0), card(13, 0), card(12, 0), card(11, 0), card(10, 0)];
        let (mult, tag) = determine_payout(&mut hand);
        assert_eq!(tag, 9);
        assert_eq!(mult, dec("100"));
    }

    #[test]
    fn four_of_a_kind() {
        let mut hand = vec![card(7, 0), card(7, 1), card(7, 2), card(7, 3), card(2, 0)];
        let (mult, tag) = determine_payout(&mut hand);
        assert_eq!(tag, 7);
        assert_eq!(mult, dec("30"));
    }

    #[test]
    fn no_hand_pays_zero() {
        let mut hand = vec![card(2, 0), card(5, 1), card(9, 2), card(11, 3), card(4, 0)];
        let (mult, tag) = determine_payout(&mut hand);
        assert_eq!(tag, 0);
        assert_eq!(mult, zero());
    }
}
