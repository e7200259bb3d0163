//! Client configuration.
//!
//! Configuration is a plain value handed to
//! [`EngageClient::from_config`](crate::EngageClient::from_config). Nothing is
//! read from process-wide state after construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engage_transfer::FtpConfig;
use engage_transport::{HttpTransportConfig, LimitsConfig, TimeoutConfig};
use serde::{Deserialize, Serialize};

use crate::client::Credentials;
use crate::job::PollPolicy;

/// Default environment variable prefix for overrides.
pub const DEFAULT_ENV_PREFIX: &str = "ENGAGE";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngageConfig {
    /// XML API endpoint and credentials
    pub api: ApiConfig,
    /// Bulk transfer channel; bulk operations fail without it
    #[serde(default)]
    pub transfer: Option<TransferSettings>,
    /// Job polling bounds
    #[serde(default)]
    pub polling: PollConfig,
    /// Logging setup used by [`crate::logging::init_tracing`]
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// XML API settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Endpoint URL, e.g. `https://api-campaign-us-1.goacoustic.com/XMLAPI`
    pub url: String,
    /// API user
    pub username: String,
    /// API password
    pub password: String,
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Per-request timeout in seconds; 0 disables it
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum accepted response size in bytes
    #[serde(default)]
    pub max_response_size: Option<usize>,
}

/// Bulk transfer host settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct TransferSettings {
    /// Host name
    pub host: String,
    /// Control port; 21 when absent
    #[serde(default)]
    pub port: Option<u16>,
    /// Login name
    pub username: String,
    /// Password
    pub password: String,
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Per-reply and per-read timeout in seconds
    #[serde(default = "default_transfer_io_timeout_secs")]
    pub io_timeout_secs: u64,
}

/// Job polling settings, converted into a [`PollPolicy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// First delay between status checks, in milliseconds
    pub interval_ms: u64,
    /// Upper bound for the delay, in milliseconds
    pub max_interval_ms: u64,
    /// Growth factor applied after every check
    pub backoff_multiplier: f64,
    /// Maximum number of status checks
    pub max_attempts: u32,
    /// Maximum total polling time in seconds; `None` = no wall-clock bound
    pub max_wait_secs: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_transfer_io_timeout_secs() -> u64 {
    300
}

impl Default for PollConfig {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            interval_ms: duration_ms(policy.initial_interval),
            max_interval_ms: duration_ms(policy.max_interval),
            backoff_multiplier: policy.multiplier,
            max_attempts: policy.max_attempts,
            max_wait_secs: policy.max_wait.map(|d| d.as_secs()),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl From<&PollConfig> for PollPolicy {
    fn from(config: &PollConfig) -> Self {
        let initial = Duration::from_millis(config.interval_ms);
        Self {
            initial_interval: initial,
            max_interval: Duration::from_millis(config.max_interval_ms).max(initial),
            multiplier: if config.backoff_multiplier.is_finite() && config.backoff_multiplier >= 1.0 {
                config.backoff_multiplier
            } else {
                1.0
            },
            max_attempts: config.max_attempts.max(1),
            max_wait: config.max_wait_secs.map(Duration::from_secs),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_response_size", &self.max_response_size)
            .finish()
    }
}

impl fmt::Debug for TransferSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("io_timeout_secs", &self.io_timeout_secs)
            .finish()
    }
}

impl ApiConfig {
    /// Credentials used by [`crate::EngageClient::login`].
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }

    /// Settings for the HTTP transport.
    pub fn transport_config(&self) -> HttpTransportConfig {
        let request = (self.request_timeout_secs > 0)
            .then(|| Duration::from_secs(self.request_timeout_secs));
        let mut limits = LimitsConfig::default();
        if self.max_response_size.is_some() {
            limits.max_response_size = self.max_response_size;
        }
        HttpTransportConfig::new(&self.url)
            .with_timeouts(TimeoutConfig {
                connect: Duration::from_secs(self.connect_timeout_secs),
                request,
            })
            .with_limits(limits)
    }
}

impl TransferSettings {
    /// Settings for the FTP transfer service.
    pub fn ftp_config(&self) -> FtpConfig {
        let mut config = FtpConfig::new(&self.host, &self.username, &self.password);
        config.port = self.port;
        config.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        config.io_timeout = Duration::from_secs(self.io_timeout_secs);
        config
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported file format
    #[error("Unsupported configuration file format. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat,

    /// Configuration parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),

    /// A value was well-formed but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl EngageConfig {
    /// Load configuration from a file (TOML, YAML, or JSON).
    ///
    /// Environment variables with the `ENGAGE_` prefix override file
    /// settings, with `__` between nested keys: `ENGAGE_API__URL`,
    /// `ENGAGE_POLLING__MAX_ATTEMPTS`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use engage::EngageConfig;
    ///
    /// let config = EngageConfig::from_file("engage.toml").expect("Failed to load config");
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_file_with_prefix(path, DEFAULT_ENV_PREFIX)
    }

    /// Load configuration from a file with a custom environment prefix.
    pub fn from_file_with_prefix(
        path: impl AsRef<Path>,
        env_prefix: &str,
    ) -> Result<Self, ConfigError> {
        use config::{Config, File, FileFormat};

        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => return Err(ConfigError::UnsupportedFormat),
        };

        let config = Config::builder()
            .add_source(File::new(
                path.to_str().ok_or(ConfigError::UnsupportedFormat)?,
                format,
            ))
            .add_source(
                config::Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Check values serde cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.url must not be empty".into()));
        }
        if self.api.username.is_empty() {
            return Err(ConfigError::Invalid("api.username must not be empty".into()));
        }
        if let Some(transfer) = &self.transfer
            && transfer.host.trim().is_empty()
        {
            return Err(ConfigError::Invalid("transfer.host must not be empty".into()));
        }
        Ok(())
    }

    /// Poll policy derived from [`PollConfig`].
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::from(&self.polling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str, extension: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(extension)
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const TOML: &str = r#"
[api]
url = "https://api.example.com/XMLAPI"
username = "api-user"
password = "api-secret"

[transfer]
host = "transfer.example.com"
username = "ftp-user"
password = "ftp-secret"

[polling]
interval_ms = 1000
max_attempts = 10
"#;

    #[test]
    fn test_load_toml() {
        let file = write_config(TOML, ".toml");
        let config = EngageConfig::from_file_with_prefix(file.path(), "ENGAGE_TEST_UNSET").unwrap();

        assert_eq!(config.api.url, "https://api.example.com/XMLAPI");
        assert_eq!(config.api.request_timeout_secs, 120);
        let transfer = config.transfer.as_ref().unwrap();
        assert_eq!(transfer.ftp_config().port(), 21);
        assert_eq!(transfer.ftp_config().io_timeout, Duration::from_secs(300));

        let policy = config.poll_policy();
        assert_eq!(policy.initial_interval, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 10);
        // Unset fields keep their defaults
        assert_eq!(policy.max_interval, Duration::from_secs(60));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_transfer_is_optional() {
        let file = write_config(
            "[api]\nurl = \"https://api.example.com/XMLAPI\"\nusername = \"u\"\npassword = \"p\"\n",
            ".toml",
        );
        let config = EngageConfig::from_file_with_prefix(file.path(), "ENGAGE_TEST_UNSET").unwrap();
        assert!(config.transfer.is_none());
        assert_eq!(config.poll_policy(), PollPolicy::default());
    }

    #[test]
    fn test_missing_file() {
        let err = EngageConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let file = write_config("api = 1", ".ini");
        let err = EngageConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat));
    }

    #[test]
    fn test_empty_url_is_invalid() {
        let file = write_config(
            "[api]\nurl = \"\"\nusername = \"u\"\npassword = \"p\"\n",
            ".toml",
        );
        let err = EngageConfig::from_file_with_prefix(file.path(), "ENGAGE_TEST_UNSET").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_passwords_are_redacted() {
        let file = write_config(TOML, ".toml");
        let config = EngageConfig::from_file_with_prefix(file.path(), "ENGAGE_TEST_UNSET").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("api-secret"));
        assert!(!debug.contains("ftp-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_poll_config_is_sanitized() {
        let config = PollConfig {
            interval_ms: 2000,
            max_interval_ms: 500,
            backoff_multiplier: 0.5,
            max_attempts: 0,
            max_wait_secs: None,
        };
        let policy = PollPolicy::from(&config);
        assert_eq!(policy.max_interval, Duration::from_secs(2));
        assert_eq!(policy.multiplier, 1.0);
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn test_request_timeout_zero_disables() {
        let api = ApiConfig {
            url: "https://api.example.com/XMLAPI".into(),
            username: "u".into(),
            password: "p".into(),
            connect_timeout_secs: 5,
            request_timeout_secs: 0,
            max_response_size: Some(1024),
        };
        let transport = api.transport_config();
        assert_eq!(transport.timeouts.request, None);
        assert_eq!(transport.limits.max_response_size, Some(1024));
    }
}
