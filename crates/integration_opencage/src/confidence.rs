//! Confidence score to accuracy radius mapping
//!
//! OpenCage attaches an integer `confidence` (0-10) to every result, describing
//! the size of the bounding box the match covers. This module converts that
//! score into an approximate radius in meters.
//!
//! See <https://opencagedata.com/api#confidence>.

use serde_json::Value;

/// Return the accuracy radius in meters for a confidence score
///
/// Confidence `1` means the match is coarser than 25 km and maps to
/// `f64::INFINITY`. Confidence `0` means the service could not determine a
/// bounding box and maps to `NaN`, as does every score outside `0..=10`.
#[must_use]
pub const fn radius_in_meters(confidence: i64) -> f64 {
    match confidence {
        10 => 250.0,
        9 => 500.0,
        8 => 1_000.0,
        7 => 5_000.0,
        6 => 7_500.0,
        5 => 10_000.0,
        4 => 15_000.0,
        3 => 20_000.0,
        2 => 25_000.0,
        1 => f64::INFINITY,
        _ => f64::NAN,
    }
}

/// Return the accuracy radius for a raw JSON confidence value
///
/// Only integral JSON numbers are looked up; floats, strings and other
/// values yield `NaN`.
#[must_use]
pub fn radius_for_value(value: &Value) -> f64 {
    value.as_i64().map_or(f64::NAN, radius_in_meters)
}
