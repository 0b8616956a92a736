//! Logging configuration and initialization.

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

/// Transport crates that log every RPC round trip at debug level.
const QUIET_DEPENDENCIES: &[&str] = &["alloy_transport_http=warn", "hyper_util=warn", "reqwest=warn"];

/// Output format of the subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Apply command-line overrides on top of the file settings.
    pub fn override_with(&mut self, level: Option<&str>, json: bool) {
        if let Some(level) = level {
            self.level = level.to_string();
        }
        if json {
            self.format = LogFormat::Json;
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            QUIET_DEPENDENCIES
                .iter()
                .filter_map(|directive| directive.parse().ok())
                .fold(EnvFilter::new(&self.level), EnvFilter::add_directive)
        })
    }

    /// Initialize the tracing subscriber with this logging configuration.
    ///
    /// A second call is a no-op.
    pub fn init(&self) {
        let filter = self.filter();
        let installed = match self.format {
            LogFormat::Json => fmt().json().with_env_filter(filter).try_init(),
            LogFormat::Pretty => fmt().with_env_filter(filter).try_init(),
        };
        if installed.is_err() {
            tracing::debug!("Tracing subscriber already installed");
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_file_settings() {
        let mut config = LoggingConfig::default();
        config.override_with(Some("debug"), true);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn missing_overrides_keep_file_settings() {
        let mut config: LoggingConfig = toml::from_str("format = \"json\"").expect("logging");
        config.override_with(None, false);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
    }
}
