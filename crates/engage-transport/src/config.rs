//! Transport configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for request and response size limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum response body size in bytes.
    /// `None` = unlimited
    pub max_response_size: Option<usize>,

    /// Maximum request body size in bytes.
    /// `None` = unlimited
    pub max_request_size: Option<usize>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_response_size: Some(10 * 1024 * 1024), // 10MB
            max_request_size: Some(4 * 1024 * 1024),   // 4MB
        }
    }
}

impl LimitsConfig {
    /// Create a configuration with no limits.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_response_size: None,
            max_request_size: None,
        }
    }
}

/// Configuration for connection and request timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection establishment timeout.
    pub connect: Duration,

    /// Single request timeout, including reading the response body.
    /// `None` = no timeout
    pub request: Option<Duration>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            request: Some(Duration::from_secs(120)),
        }
    }
}

impl TimeoutConfig {
    /// Create a configuration with short timeouts, mostly useful in tests.
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            connect: Duration::from_secs(5),
            request: Some(Duration::from_secs(10)),
        }
    }

    /// Create a configuration with long timeouts for slow API calls.
    ///
    /// Large `ExportList` or `ImportList` submissions can take minutes to be
    /// acknowledged on a busy pod.
    #[must_use]
    pub const fn patient() -> Self {
        Self {
            connect: Duration::from_secs(60),
            request: Some(Duration::from_secs(600)),
        }
    }
}

/// HTTP transport configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// Full endpoint URL (e.g., `https://api-campaign-us-1.goacoustic.com/XMLAPI`)
    pub url: String,

    /// Timeouts
    pub timeouts: TimeoutConfig,

    /// Size limits for requests and responses
    pub limits: LimitsConfig,

    /// User agent string (set to None to disable User-Agent header)
    pub user_agent: Option<String>,
}

impl HttpTransportConfig {
    /// Create a configuration for the given endpoint with default timeouts and limits.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            user_agent: Some(format!("engage-client/{}", env!("CARGO_PKG_VERSION"))),
        }
    }

    /// Replace the timeout configuration.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Replace the size limits.
    #[must_use]
    pub fn with_limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_config_default() {
        let config = LimitsConfig::default();
        assert_eq!(config.max_response_size, Some(10 * 1024 * 1024));
        assert_eq!(config.max_request_size, Some(4 * 1024 * 1024));
    }

    #[test]
    fn test_timeout_config_default() {
        let config = TimeoutConfig::default();
        assert_eq!(config.connect, Duration::from_secs(30));
        assert_eq!(config.request, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_http_config_builder() {
        let config = HttpTransportConfig::new("http://localhost/XMLAPI")
            .with_timeouts(TimeoutConfig::fast())
            .with_limits(LimitsConfig::unlimited());
        assert_eq!(config.url, "http://localhost/XMLAPI");
        assert_eq!(config.timeouts, TimeoutConfig::fast());
        assert!(config.limits.max_response_size.is_none());
    }
}
