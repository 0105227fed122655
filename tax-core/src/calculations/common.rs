//! Rounding and unit conversions shared by the calculators.

use rust_decimal::{Decimal, RoundingStrategy};

/// Months used to convert between annual and monthly figures.
pub const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

const ONE_HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Rounds to cents, with exact halves going away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(6601.025)), dec!(6601.03));
/// assert_eq!(round_half_up(dec!(-0.005)), dec!(-0.01));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to whole currency units, halves away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_to_whole;
///
/// assert_eq!(round_to_whole(dec!(10499.50)), dec!(10500));
/// assert_eq!(round_to_whole(dec!(10499.49)), dec!(10499));
/// ```
pub fn round_to_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// `6.5` → `0.065`.
pub fn percent_to_rate(percent: Decimal) -> Decimal {
    percent / ONE_HUNDRED
}

pub fn monthly(annual: Decimal) -> Decimal {
    annual / MONTHS_PER_YEAR
}

pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}
