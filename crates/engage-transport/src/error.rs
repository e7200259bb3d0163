//! Transport error types.

use std::time::Duration;
use thiserror::Error;

use crate::config::LimitsConfig;

/// Result alias for transport calls.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Failure of a single envelope exchange.
///
/// None of these are retried by the transport. Whether a failed call reached
/// the server is unknown, so callers decide.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum TransportError {
    /// The endpoint could not be reached.
    #[error("connection to endpoint failed: {0}")]
    ConnectionFailed(String),

    /// The request could not be written.
    #[error("sending envelope failed: {0}")]
    SendFailed(String),

    /// The response body could not be read.
    #[error("reading response failed: {0}")]
    ReceiveFailed(String),

    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Start of the response body
        body: String,
    },

    /// No complete response within the request timeout.
    #[error("{operation} timed out after {timeout:?} (see TimeoutConfig::patient for slow exports)")]
    RequestTimeout {
        /// What was being done when the timer fired
        operation: String,
        /// The configured timeout
        timeout: Duration,
    },

    /// Invalid endpoint URL or HTTP client settings.
    #[error("invalid transport configuration: {0}")]
    ConfigurationError(String),

    /// Envelope larger than `LimitsConfig::max_request_size`.
    #[error("envelope of {size} bytes exceeds the {max} byte request limit")]
    RequestTooLarge {
        /// Envelope size
        size: usize,
        /// Configured limit
        max: usize,
    },

    /// Response larger than `LimitsConfig::max_response_size`.
    #[error("response of {size} bytes exceeds the {max} byte response limit")]
    ResponseTooLarge {
        /// Announced or received size
        size: usize,
        /// Configured limit
        max: usize,
    },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::ReceiveFailed(err.to_string())
        } else if err.is_builder() {
            Self::ConfigurationError(err.to_string())
        } else {
            Self::SendFailed(err.to_string())
        }
    }
}

fn exceeds(size: usize, limit: Option<usize>) -> Option<usize> {
    limit.filter(|max| size > *max)
}

/// Reject an envelope larger than the request limit.
pub fn validate_request_size(size: usize, limits: &LimitsConfig) -> TransportResult<()> {
    match exceeds(size, limits.max_request_size) {
        Some(max) => Err(TransportError::RequestTooLarge { size, max }),
        None => Ok(()),
    }
}

/// Reject a response larger than the response limit.
pub fn validate_response_size(size: usize, limits: &LimitsConfig) -> TransportResult<()> {
    match exceeds(size, limits.max_response_size) {
        Some(max) => Err(TransportError::ResponseTooLarge { size, max }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = LimitsConfig::default();
        assert!(validate_request_size(1000, &limits).is_ok());
        assert!(matches!(
            validate_request_size(10 * 1024 * 1024, &limits),
            Err(TransportError::RequestTooLarge { .. })
        ));
        assert!(validate_response_size(50 * 1024 * 1024, &limits).is_err());
    }

    #[test]
    fn test_limit_is_inclusive() {
        let limits = LimitsConfig {
            max_response_size: Some(16),
            max_request_size: Some(8),
        };
        assert!(validate_request_size(8, &limits).is_ok());
        assert!(validate_request_size(9, &limits).is_err());
        assert!(validate_response_size(16, &limits).is_ok());
    }

    #[test]
    fn test_unlimited() {
        let limits = LimitsConfig::unlimited();
        assert!(validate_request_size(usize::MAX, &limits).is_ok());
        assert!(validate_response_size(usize::MAX, &limits).is_ok());
    }

    #[test]
    fn test_timeout_message_names_operation() {
        let err = TransportError::RequestTimeout {
            operation: "POST envelope".to_string(),
            timeout: Duration::from_secs(2),
        };
        assert!(err.to_string().starts_with("POST envelope timed out after 2s"));
    }
}
