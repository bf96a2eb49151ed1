//! OpenCage error types

use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur during geocoding operations
#[derive(Debug, Error)]
pub enum OpenCageError {
    /// Client configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Address or coordinate argument was empty
    #[error("INVALID_ADDRESS")]
    InvalidAddress,

    /// No response could be obtained from the service
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered with a non-200 status code in its response body
    #[error("{message}")]
    ServiceStatus {
        /// `status.code` from the response body
        code: i64,
        /// `status.message` from the response body
        message: String,
    },

    /// The response body was not in the expected format
    #[error("Parse error: {0}")]
    Parse(String),

    /// Non-2xx HTTP status with a body that could not be interpreted
    #[error("Unexpected HTTP status {status}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
    },
}

impl OpenCageError {
    /// Returns true if this error is retryable
    ///
    /// The client itself never retries; this is a hint for callers.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_retryable(),
            Self::ServiceStatus { code, .. } => *code == 429 || *code >= 500,
            Self::HttpStatus { status } => *status == 429 || *status >= 500,
            Self::Configuration(_) | Self::InvalidAddress | Self::Parse(_) => false,
        }
    }

    /// Returns true if the service reported an exhausted quota or rate limit
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::ServiceStatus {
                code: 402 | 429,
                ..
            } | Self::HttpStatus {
                status: 402 | 429
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_display() {
        assert_eq!(OpenCageError::InvalidAddress.to_string(), "INVALID_ADDRESS");
    }

    #[test]
    fn test_service_status_display_is_verbatim() {
        let err = OpenCageError::ServiceStatus {
            code: 402,
            message: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn test_transport_error_is_transparent() {
        let err = OpenCageError::from(TransportError::ConnectionFailed("dns".to_string()));
        assert_eq!(err.to_string(), "Connection failed: dns");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(
            OpenCageError::Transport(TransportError::Timeout { timeout_secs: 10 }).is_retryable()
        );
        assert!(
            OpenCageError::ServiceStatus {
                code: 503,
                message: "unavailable".to_string()
            }
            .is_retryable()
        );
        assert!(OpenCageError::HttpStatus { status: 429 }.is_retryable());
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(!OpenCageError::InvalidAddress.is_retryable());
        assert!(!OpenCageError::Configuration("x".to_string()).is_retryable());
        assert!(!OpenCageError::Parse("x".to_string()).is_retryable());
        assert!(
            !OpenCageError::ServiceStatus {
                code: 403,
                message: "disabled".to_string()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_rate_limited() {
        assert!(
            OpenCageError::ServiceStatus {
                code: 402,
                message: "quota exceeded".to_string()
            }
            .is_rate_limited()
        );
        assert!(OpenCageError::HttpStatus { status: 429 }.is_rate_limited());
        assert!(!OpenCageError::HttpStatus { status: 400 }.is_rate_limited());
    }
}
