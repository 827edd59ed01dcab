//! Shared helpers for string → f64 conversions.
//!
//! Dataset values arrive as strings. Two parse strategies exist because
//! coordinates and scalar weather values have different failure policies:
//!
//! - `parse_finite`: `None` for anything that is not a finite number (coordinates,
//!   where a failure excludes the whole record)
//! - `parse_or_nan`: NaN on failure (scalar fields, where a failure only
//!   invalidates that one value)

/// Offset between Kelvin and Celsius.
const KELVIN_OFFSET: f64 = 273.15;

/// Parse a trimmed string as a finite f64.
///
/// Returns `None` for empty, non-numeric, NaN and ±Inf inputs.
pub(crate) fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a trimmed string as f64, returning NaN when it is not a finite number.
pub(crate) fn parse_or_nan(s: &str) -> f64 {
    parse_finite(s).unwrap_or(f64::NAN)
}

/// Convert a Kelvin temperature to Celsius. NaN stays NaN.
pub(crate) fn kelvin_to_celsius(k: f64) -> f64 {
    k - KELVIN_OFFSET
}

/// Arithmetic mean of a slice, NaN when the slice is empty or contains a
/// non-finite value.
pub(crate) fn finite_mean(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
