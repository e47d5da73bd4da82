//! Configuration types for boomerang

use crate::options::{validate_options, ValidatedArgs, ValidationError};
use crate::telemetry::LogFormat;
use serde::Deserialize;
use serde_json::Value;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Connection target and reconnection options
///
/// Values are kept untyped so they go through the same validation as any
/// other untyped input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub url: Value,
    /// A single name or a list of names
    pub protocols: Option<Value>,
    /// Keys as accepted by [`validate_options`], e.g. `reconnectDelay`
    pub options: Option<Value>,
}

impl ConnectionConfig {
    /// Check the connection settings and resolve defaults
    pub fn validate(&self) -> Result<ValidatedArgs, ValidationError> {
        validate_options(&self.url, self.protocols.as_ref(), self.options.as_ref())
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port; no exporter when unset
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
