//! Conversion of `NUMERIC(9,6)` coordinate columns into ranking inputs.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Convert a stored coordinate to `f64`, keeping NULL as `None`.
///
/// `NUMERIC(9,6)` values always fit in an `f64`; a failed conversion is
/// reported as missing rather than as a fabricated zero.
pub(crate) fn coordinate(value: Option<Decimal>) -> Option<f64> {
    value.and_then(|d| d.to_f64())
}
