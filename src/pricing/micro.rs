//! Conversions between decimal prices and ad-server micro-amounts.
//!
//! Ad servers express money as integer micro-amounts (`value × 1_000_000`).
//!
//! Rounding rule:
//! - the input is taken at its shortest decimal representation (what `{}`
//!   prints for the `f64`), so `0.105` is treated as exactly `0.105`
//! - it is rounded half away from zero at `precision` decimal digits
//!   (`0.105` at precision 2 → `0.11` → `110_000`)
//! - precisions above 6 round at that finer digit, then truncate to whole micros
//!
//! Decimal arithmetic (`rust_decimal`) is used so midpoints behave the same on
//! every platform instead of depending on binary float artifacts.

use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of micro-units in one currency unit.
pub const MICROS_PER_UNIT: i64 = 1_000_000;

/// Decimal digits carried by a micro-amount.
pub const MICRO_DIGITS: u32 = 6;

/// Largest scale `rust_decimal` can represent.
const MAX_DECIMAL_SCALE: u32 = 28;

/// Convert `num` into a micro-amount rounded at `precision` decimal digits.
///
/// Never fails: non-finite input yields `0` and out-of-range values saturate.
pub fn number_to_micro_amount(num: f64, precision: u32) -> i64 {
    let Some(value) = to_decimal(num) else {
        return 0;
    };

    let rounded =
        value.round_dp_with_strategy(precision.min(MAX_DECIMAL_SCALE), RoundingStrategy::MidpointAwayFromZero);

    match rounded.checked_mul(Decimal::from(MICROS_PER_UNIT)) {
        Some(micros) => micros.trunc().to_i64().unwrap_or(saturate(num)),
        None => saturate(num),
    }
}

/// Convert a micro-amount back into a plain number.
pub fn micro_amount_to_number(micro_amount: i64) -> f64 {
    micro_amount as f64 / MICROS_PER_UNIT as f64
}

/// Fixed-point formatting with exactly `precision` fractional digits.
///
/// Always uses `.` as the decimal separator.
pub fn number_to_string(num: f64, precision: u32) -> String {
    format!("{num:.prec$}", prec = precision as usize)
}

/// Format a micro-amount with exactly `precision` fractional digits.
///
/// Unlike going through `micro_amount_to_number`, this is exact: the string
/// always parses back to the same micro-amount when `precision` is at least
/// the precision the micro-amount was built with.
pub fn micro_amount_to_string(micro_amount: i64, precision: u32) -> String {
    let precision = precision.min(MAX_DECIMAL_SCALE);
    let value = Decimal::new(micro_amount, MICRO_DIGITS)
        .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    format!("{value:.prec$}", prec = precision as usize)
}

fn to_decimal(num: f64) -> Option<Decimal> {
    if !num.is_finite() {
        return None;
    }
    // Display for f64 is the shortest string that round-trips; fall back to the
    // binary value for magnitudes `rust_decimal` cannot parse from text.
    Decimal::from_str(&num.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(num))
}

fn saturate(num: f64) -> i64 {
    if num.is_sign_negative() { i64::MIN } else { i64::MAX }
}
