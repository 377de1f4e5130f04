//! money helpers backed by rust_decimal

use rust_decimal::prelude::*;

/// Decimal places kept for stored prices.
pub(crate) const PRICE_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation, `None` for NaN, infinities and
/// magnitudes beyond Decimal range
#[inline]
pub(crate) fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
}

/// Convert Decimal back to f64 without rounding
#[inline]
pub(crate) fn from_decimal(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Round half away from zero to `places` decimals.
///
/// The value goes through its shortest decimal representation first, so
/// 19.995 rounds to 20.00 even though the nearest f64 sits just below it.
/// `None` when the value has no Decimal representation.
pub(crate) fn round_price(value: f64, places: u32) -> Option<f64> {
    to_decimal(value).map(|value| round_decimal(value, places))
}

/// Round a Decimal half away from zero and convert back for storage.
pub(crate) fn round_decimal(value: Decimal, places: u32) -> f64 {
    value
        .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}
