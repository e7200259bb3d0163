//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! application's choice. This helper covers the common case.

use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConfigError, LoggingConfig};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over `config.level` when set. Fails if the filter does not
/// parse or a global subscriber is already installed.
///
/// ```rust,no_run
/// use engage::{LoggingConfig, logging};
///
/// logging::init_tracing(&LoggingConfig::default())?;
/// # Ok::<(), engage::ConfigError>(())
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    let env_filter = build_filter(&config.level)?;

    let result = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| ConfigError::Invalid(format!("cannot install subscriber: {e}")))
}

fn build_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| ConfigError::Invalid(format!("Invalid log level: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_directives() {
        assert!(build_filter("engage=debug,engage_transfer=info").is_ok());
    }
}
