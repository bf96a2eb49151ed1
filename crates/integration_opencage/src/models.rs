//! OpenCage response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::confidence::radius_in_meters;
use crate::transport::RawHttpResponse;

/// A single geocoding result
///
/// Provider-defined fields (`formatted`, `components`, `geometry`,
/// `annotations`, ...) are kept as raw JSON in [`fields`](Self::fields);
/// typed accessors cover the common ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResult {
    /// Result precision, 0 (unknown) to 10 (within 250 m)
    #[serde(
        default,
        deserialize_with = "integer_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<i64>,

    /// Accuracy radius in meters derived from `confidence`
    ///
    /// `NaN` for confidence 0 or a missing score, infinite for confidence 1.
    #[serde(
        rename = "confidenceInM",
        default = "nan",
        deserialize_with = "float_or_nan"
    )]
    pub confidence_in_m: f64,

    /// Remaining provider fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl GeocodeResult {
    /// Recompute `confidence_in_m` from `confidence`
    pub fn attach_radius(&mut self) {
        self.confidence_in_m = self.confidence.map_or(f64::NAN, radius_in_meters);
    }

    /// Look up a raw provider field
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Formatted, human-readable address
    #[must_use]
    pub fn formatted(&self) -> Option<&str> {
        self.fields.get("formatted").and_then(Value::as_str)
    }

    /// Address components (country, city, road, ...)
    #[must_use]
    pub fn components(&self) -> Option<&Map<String, Value>> {
        self.fields.get("components").and_then(Value::as_object)
    }

    /// Center point of the result
    #[must_use]
    pub fn geometry(&self) -> Option<Geometry> {
        let geometry = self.fields.get("geometry")?;
        Some(Geometry {
            lat: geometry.get("lat")?.as_f64()?,
            lng: geometry.get("lng")?.as_f64()?,
        })
    }
}

/// Latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

/// Rate-limit block from the response body
///
/// Absent for accounts without a request limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateInfo {
    /// Requests allowed per period
    pub limit: u64,
    /// Requests left in the current period
    pub remaining: u64,
    /// Unix timestamp of the next reset
    pub reset: i64,
}

impl RateInfo {
    /// Time of the next quota reset
    #[must_use]
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.reset, 0)
    }
}

/// Full response for a successful request
#[derive(Debug, Clone)]
pub struct GeocodeResponse {
    /// Number of results reported by the service
    pub total_results: u64,
    /// Rate-limit information, if the account has a limit
    pub rate: Option<RateInfo>,
    /// Results, most confident first
    pub results: Vec<GeocodeResult>,
}

/// Rate-limit headers of a response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitHeaders {
    /// `X-RateLimit-Limit`
    pub limit: Option<String>,
    /// `X-RateLimit-Remaining`
    pub remaining: Option<String>,
    /// `X-RateLimit-Reset`
    pub reset: Option<String>,
}

impl RateLimitHeaders {
    /// Header name of the request limit
    pub const LIMIT: &'static str = "X-RateLimit-Limit";
    /// Header name of the remaining request count
    pub const REMAINING: &'static str = "X-RateLimit-Remaining";
    /// Header name of the reset timestamp
    pub const RESET: &'static str = "X-RateLimit-Reset";

    /// Extract rate-limit headers from a response
    #[must_use]
    pub fn from_response(response: &RawHttpResponse) -> Self {
        Self {
            limit: response.header(Self::LIMIT).map(str::to_string),
            remaining: response.header(Self::REMAINING).map(str::to_string),
            reset: response.header(Self::RESET).map(str::to_string),
        }
    }

    /// Returns true if the limit or remaining count is present
    #[must_use]
    pub const fn has_quota(&self) -> bool {
        self.limit.is_some() || self.remaining.is_some()
    }

    /// Time of the next quota reset, if the header holds a Unix timestamp
    #[must_use]
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        let secs: i64 = self.reset.as_deref()?.trim().parse().ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

/// Raw response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    pub status: ApiStatus,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub rate: Option<RateInfo>,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiStatus {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

const fn nan() -> f64 {
    f64::NAN
}

fn integer_or_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_i64))
}

fn float_or_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64).unwrap_or(f64::NAN))
}
