//! OpenCage client configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::logger::EventLogger;

/// Configuration for the OpenCage geocoding client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenCageConfig {
    /// API key (required)
    #[serde(default)]
    pub api_key: Option<String>,

    /// API host name
    #[serde(default = "default_api_domain")]
    pub api_domain: String,

    /// API version path segment
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// TCP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Use HTTPS; disable only for local test servers
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Receives rate-limit events
    #[serde(skip)]
    pub logger: EventLogger,
}

/// `OPENCAGE_` prefixed variables; numeric-looking values are parsed
fn environment() -> config::Environment {
    config::Environment::with_prefix("OPENCAGE")
        .prefix_separator("_")
        .try_parsing(true)
}

fn default_api_domain() -> String {
    "api.opencagedata.com".to_string()
}

fn default_api_version() -> String {
    "v1".to_string()
}

const fn default_port() -> u16 {
    443
}

const fn default_use_tls() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("integration_opencage/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for OpenCageConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_domain: default_api_domain(),
            api_version: default_api_version(),
            port: default_port(),
            use_tls: default_use_tls(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            logger: EventLogger::noop(),
        }
    }
}

impl OpenCageConfig {
    /// Create a configuration with the given API key and defaults otherwise
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            api_key: Some("test-api-key".to_string()),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    /// Install the rate-limit event logger
    #[must_use]
    pub fn with_logger(mut self, logger: EventLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Load configuration from an optional file and the environment
    ///
    /// Environment variables use the `OPENCAGE_` prefix, e.g.
    /// `OPENCAGE_API_KEY` or `OPENCAGE_API_DOMAIN`, and override file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::load_with(path, environment())
    }

    fn load_with(
        path: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder.add_source(environment).build()?.try_deserialize()
    }

    /// The configured API key, if present and non-empty
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key().is_none() {
            return Err(
                "no API key given, please provide a configuration with an api_key".to_string(),
            );
        }

        if self.api_domain.is_empty() {
            return Err("api_domain must not be empty".to_string());
        }

        if self.api_version.is_empty() {
            return Err("api_version must not be empty".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}
