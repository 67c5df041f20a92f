//! The exact-decimal arithmetic contract (component C).
//!
//! All monetary and multiplier math in this crate family goes through
//! [`Decimal`], an arbitrary-precision, arbitrary-scale decimal. `f64` never
//! appears on a money or multiplier path: every add/sub/mul/div is exact,
//! and `stop_win`/`stop_loss` comparisons use decimal ordering rather than
//! float comparison.

use bigdecimal::BigDecimal;
use std::str::FromStr;

/// Exact decimal used for balances, stakes, profits and payout multipliers.
///
/// Backed by [`bigdecimal::BigDecimal`], which stores an arbitrary-precision
/// integer mantissa plus a scale — comfortably exceeding the `numeric(1000,4)`
/// column type the source schema uses for the same fields.
pub type Decimal = BigDecimal;

/// Parses a decimal literal, panicking on malformed input.
///
/// Intended for constants and test fixtures where the literal is known good
/// at compile time; never call this on untrusted input.
pub fn dec(literal: &str) -> Decimal {
    Decimal::from_str(literal).unwrap_or_else(|e| panic!("bad decimal literal {literal:?}: {e}"))
}

/// The additive identity.
pub fn zero() -> Decimal {
    Decimal::from(0)
}

/// Converts a raw unsigned count (e.g. a number of sub-games) into a decimal.
pub fn from_u64(n: u64) -> Decimal {
    Decimal::from(n)
}

/// Linearly remaps `value` from `[from_lo, from_hi]` into `[to_lo, to_hi]`,
/// matching the `remap` helper the dice-family games derive their roll
/// from. All four division-adjacent steps are exact decimal ops.
pub fn remap(value: &Decimal, from_lo: &Decimal, from_hi: &Decimal, to_lo: &Decimal, to_hi: &Decimal) -> Decimal {
    let span_from = from_hi - from_lo;
    let span_to = to_hi - to_lo;
    let fraction = (value - from_lo) / span_from;
    fraction * span_to + to_lo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_endpoints() {
        let lo = dec("1.0421");
        let hi = dec("99.9999");
        let u64_max = dec("18446744073709551615");
        assert_eq!(remap(&zero(), &zero(), &u64_max, &lo, &hi), lo);
        assert_eq!(remap(&u64_max, &zero(), &u64_max, &lo, &hi), hi);
    }

    #[test]
    fn decimal_add_is_exact() {
        let a = dec("0.1");
        let b = dec("0.2");
        assert_eq!(a + b, dec("0.3"));
    }
}
