//! OpenCage geocoding integration
//!
//! Provides forward and reverse geocoding via the
//! [OpenCage Data](https://opencagedata.com/api) API. Every result is
//! annotated with an accuracy radius in meters derived from its confidence
//! score, and results are returned most confident first.
//!
//! # Architecture
//!
//! [`Geocoder`] defines the interface for address search and reverse lookup,
//! implemented by [`OpenCageClient`]. Requests go through the [`HttpTransport`]
//! trait, backed by `reqwest` in [`ReqwestTransport`]; tests and embedders can
//! substitute their own transport. Rate-limit headers are reported through
//! the [`EventLogger`] callback from the configuration.
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_opencage::{EventLogger, Geocoder, OpenCageClient, OpenCageConfig};
//!
//! let config = OpenCageConfig::new("your-api-key").with_logger(EventLogger::new(
//!     |event, value| tracing::info!(event, ?value, "OpenCage rate limit"),
//! ));
//! let client = OpenCageClient::new(&config)?;
//!
//! let results = client.search("Brandenburger Tor, Berlin", None).await?;
//! for result in &results {
//!     println!("{:?} within {} m", result.formatted(), result.confidence_in_m);
//! }
//!
//! let places = client.reverse(52.5163.into(), 13.3777.into(), None).await?;
//! ```

mod client;
mod confidence;
mod config;
mod error;
mod logger;
mod models;
mod query;
mod transport;

pub use client::{Geocoder, OpenCageClient};
pub use confidence::{radius_for_value, radius_in_meters};
pub use config::OpenCageConfig;
pub use error::OpenCageError;
pub use logger::{
    EventLogger, RATE_LIMIT_LIMIT_EVENT, RATE_LIMIT_REMAINING_EVENT, RATE_LIMIT_RESET_EVENT,
};
pub use models::{GeocodeResponse, GeocodeResult, Geometry, RateInfo, RateLimitHeaders};
pub use query::{QueryParams, QueryValue, encode as encode_query, escape_address};
pub use transport::{
    HttpTransport, RawHttpResponse, ReqwestTransport, RequestOptions, Scheme, TransportError,
};
