//! OpenCage geocoding client
//!
//! Forward (address → results) and reverse (coordinates → results)
//! geocoding via the [OpenCage](https://opencagedata.com/api) API.
//!
//! HTTP 4xx responses are not treated as failures on their own: the service
//! explains quota and key problems in the JSON body, so those responses are
//! parsed like any other and surface as [`OpenCageError::ServiceStatus`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::config::OpenCageConfig;
use crate::error::OpenCageError;
use crate::logger::{
    EventLogger, RATE_LIMIT_LIMIT_EVENT, RATE_LIMIT_REMAINING_EVENT, RATE_LIMIT_RESET_EVENT,
};
use crate::models::{ApiResponse, GeocodeResponse, GeocodeResult, RateLimitHeaders};
use crate::query::{self, QueryParams, QueryValue, escape_address};
use crate::transport::{HttpTransport, RawHttpResponse, ReqwestTransport, RequestOptions, Scheme};

/// Trait for geocoding clients
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up a free-form address
    ///
    /// `options` are passed to the service as additional query parameters.
    async fn search(
        &self,
        address: &str,
        options: Option<&QueryParams>,
    ) -> Result<Vec<GeocodeResult>, OpenCageError>;

    /// Look up the places at a coordinate pair
    async fn reverse(
        &self,
        latitude: QueryValue,
        longitude: QueryValue,
        options: Option<&QueryParams>,
    ) -> Result<Vec<GeocodeResult>, OpenCageError>;
}

/// OpenCage API client
#[derive(Clone)]
pub struct OpenCageClient {
    transport: Arc<dyn HttpTransport>,
    api_key: String,
    api_domain: String,
    api_version: String,
    scheme: Scheme,
    port: u16,
    logger: EventLogger,
}

impl fmt::Debug for OpenCageClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenCageClient")
            .field("api_domain", &self.api_domain)
            .field("api_version", &self.api_version)
            .field("scheme", &self.scheme)
            .field("port", &self.port)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

impl OpenCageClient {
    /// Create a new client backed by `reqwest`
    ///
    /// No request is made.
    ///
    /// # Errors
    ///
    /// Returns [`OpenCageError::Configuration`] if the API key is missing or
    /// the configuration is otherwise invalid, or a transport error if the
    /// HTTP client cannot be initialized.
    pub fn new(config: &OpenCageConfig) -> Result<Self, OpenCageError> {
        config.validate().map_err(OpenCageError::Configuration)?;
        let transport = ReqwestTransport::new(config.timeout_secs, &config.user_agent)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a new client with a custom transport
    ///
    /// # Errors
    ///
    /// Returns [`OpenCageError::Configuration`] if the configuration is invalid.
    pub fn with_transport(
        config: &OpenCageConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, OpenCageError> {
        config.validate().map_err(OpenCageError::Configuration)?;

        let api_key = config
            .api_key()
            .ok_or_else(|| OpenCageError::Configuration("API key is required".to_string()))?
            .to_string();

        Ok(Self {
            transport,
            api_key,
            api_domain: config.api_domain.clone(),
            api_version: config.api_version.clone(),
            scheme: if config.use_tls {
                Scheme::Https
            } else {
                Scheme::Http
            },
            port: config.port,
            logger: config.logger.clone(),
        })
    }

    /// Run a query with arbitrary parameters and return the results
    ///
    /// `params` should contain at least `q`; `key` is always set to the
    /// configured API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service reports a
    /// non-200 status.
    pub async fn query(&self, params: QueryParams) -> Result<Vec<GeocodeResult>, OpenCageError> {
        self.query_response(params).await.map(|r| r.results)
    }

    /// Run a query and return the full response including rate information
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service reports a
    /// non-200 status.
    #[instrument(skip(self, params))]
    pub async fn query_response(
        &self,
        mut params: QueryParams,
    ) -> Result<GeocodeResponse, OpenCageError> {
        debug!(q = ?params.get("q"), "Making request");

        params.insert("key", self.api_key.clone());
        let path = format!("/geocode/{}/json", self.api_version);

        let response = self
            .transport
            .perform(
                RequestOptions::get(self.scheme, self.api_domain.clone(), self.port, path)
                    .with_query(query::encode(&params)),
            )
            .await?;

        self.report_rate_limits(&response);
        Self::parse_response(&response)
    }

    /// Pass rate-limit headers to the event logger
    fn report_rate_limits(&self, response: &RawHttpResponse) {
        let headers = RateLimitHeaders::from_response(response);

        if response.is_client_error() {
            warn!(status = response.status, "Request error");
            if let Some(reset) = headers.reset.as_deref() {
                self.logger.log(RATE_LIMIT_RESET_EVENT, Some(reset));
            }
        }

        if headers.has_quota() {
            self.logger
                .log(RATE_LIMIT_LIMIT_EVENT, headers.limit.as_deref());
            self.logger
                .log(RATE_LIMIT_REMAINING_EVENT, headers.remaining.as_deref());
        }
    }

    /// Parse the response body into sorted, radius-annotated results
    fn parse_response(response: &RawHttpResponse) -> Result<GeocodeResponse, OpenCageError> {
        let envelope: ApiResponse = match serde_json::from_str(&response.body) {
            Ok(envelope) => envelope,
            Err(e) if !response.is_success() => {
                warn!(status = response.status, error = %e, "Unparseable error response");
                return Err(OpenCageError::HttpStatus {
                    status: response.status,
                });
            },
            Err(e) => return Err(OpenCageError::Parse(e.to_string())),
        };

        if envelope.status.code != 200 {
            return Err(OpenCageError::ServiceStatus {
                code: envelope.status.code,
                message: envelope.status.message,
            });
        }

        debug!(total_results = envelope.total_results, "Total results returned");

        let mut results = envelope.results;
        for result in &mut results {
            result.attach_radius();
        }
        results.sort_by(|a, b| b.confidence.cmp(&a.confidence));

        Ok(GeocodeResponse {
            total_results: envelope.total_results,
            rate: envelope.rate,
            results,
        })
    }
}

#[async_trait]
impl Geocoder for OpenCageClient {
    #[instrument(skip(self, options))]
    async fn search(
        &self,
        address: &str,
        options: Option<&QueryParams>,
    ) -> Result<Vec<GeocodeResult>, OpenCageError> {
        if address.is_empty() {
            return Err(OpenCageError::InvalidAddress);
        }

        let mut params = QueryParams::new().with("q", escape_address(address));
        if let Some(options) = options {
            params.merge(options);
        }

        self.query(params).await
    }

    #[instrument(skip(self, options))]
    async fn reverse(
        &self,
        latitude: QueryValue,
        longitude: QueryValue,
        options: Option<&QueryParams>,
    ) -> Result<Vec<GeocodeResult>, OpenCageError> {
        if latitude.is_blank() || longitude.is_blank() {
            return Err(OpenCageError::InvalidAddress);
        }

        let mut params = QueryParams::new().with("q", format!("{latitude},{longitude}"));
        if let Some(options) = options {
            params.merge(options);
        }

        self.query(params).await
    }
}
