//! Money rounding and display helpers
//!
//! All amounts are `Decimal`. Statistics round up to the next cent so a total
//! never shows lower than what is actually owed; individual amounts round to
//! the nearest cent and never go below zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Cents precision used for every displayed amount
pub const CENT_SCALE: u32 = 2;

/// Digits kept before ceiling. Division leaves noise in the last places of a
/// 28-digit decimal (`119.999...97`), which must not bump a total by a cent.
pub(crate) const NOISE_SCALE: u32 = 10;

/// Round up to the next cent.
pub fn round_up_cents(value: Decimal) -> Decimal {
    value
        .round_dp(NOISE_SCALE)
        .round_dp_with_strategy(CENT_SCALE, RoundingStrategy::ToPositiveInfinity)
}

/// Round to the nearest cent, floored at zero.
pub fn round_amount(value: Decimal) -> Decimal {
    let rounded = value.round_dp_with_strategy(CENT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        rounded
    }
}

/// Render a statistic.
///
/// Negative values render as a bare `"0"`; everything else is ceiled to the
/// cent and printed with two decimals, so an exact zero is `"0.00"`.
pub fn format_statistic(value: Decimal) -> String {
    if value < Decimal::ZERO {
        return "0".to_string();
    }
    fixed_cents(round_up_cents(value))
}

/// Render an individual amount with two decimals.
pub fn format_amount(value: Decimal) -> String {
    fixed_cents(round_amount(value))
}

/// Two-decimal rendering without rounding direction of its own
pub fn fixed_cents(value: Decimal) -> String {
    if value.is_zero() {
        // drop a possible negative-zero sign
        return "0.00".to_string();
    }
    format!("{:.2}", value)
}
