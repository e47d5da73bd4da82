//! CLI interface for boomerang
//!
//! Provides subcommands for:
//! - `connect`: Open a reconnecting socket and bridge it to stdin/stdout
//! - `validate`: Check connection settings without connecting
//! - `config`: Show configuration

mod connect;
mod validate;

pub use connect::ConnectArgs;
pub use validate::ValidateArgs;

use crate::config::ConnectionConfig;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(name = "boomerang")]
#[command(about = "A WebSocket client that reconnects on its own")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect and stream messages until Ctrl-C
    Connect(ConnectArgs),
    /// Validate connection settings
    Validate(ValidateArgs),
    /// Show configuration
    Config,
}

/// Overrides for the `[connection]` section
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionOverrides {
    /// WebSocket url
    #[arg(short, long)]
    pub url: Option<String>,

    /// Sub-protocol to request (repeatable)
    #[arg(short, long = "protocol")]
    pub protocols: Vec<String>,

    /// Options as a JSON object, e.g. '{"reconnectDelay": 500}'
    #[arg(short, long)]
    pub options: Option<String>,
}

impl ConnectionOverrides {
    /// Apply the overrides on top of the configured connection
    pub fn apply(&self, mut connection: ConnectionConfig) -> anyhow::Result<ConnectionConfig> {
        if let Some(url) = &self.url {
            connection.url = Value::from(url.as_str());
        }
        if !self.protocols.is_empty() {
            connection.protocols = Some(Value::from(self.protocols.clone()));
        }
        if let Some(options) = &self.options {
            let options: Value = serde_json::from_str(options)
                .map_err(|e| anyhow::anyhow!("--options is not valid JSON: {}", e))?;
            connection.options = Some(options);
        }
        Ok(connection)
    }
}
