//! Validate command implementation

use super::ConnectionOverrides;
use crate::config::ConnectionConfig;
use clap::Args;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub connection: ConnectionOverrides,
}

impl ValidateArgs {
    pub fn execute(&self, configured: &ConnectionConfig) -> anyhow::Result<()> {
        let connection = self.connection.apply(configured.clone())?;

        match connection.validate() {
            Ok(args) => {
                println!("Connection settings are valid:");
                println!("  Url: {}", args.url);
                println!("  Protocols: {:?}", args.protocols.to_vec());
                println!("  Connect timeout: {:?}", args.options.connect_timeout);
                println!("  Reconnect: {}", args.options.reconnect);
                match args.options.reconnect_attempts {
                    Some(attempts) => println!("  Reconnect attempts: {}", attempts),
                    None => println!("  Reconnect attempts: unbounded"),
                }
                println!("  Reconnect delay: {:?}", args.options.reconnect_delay);
                println!(
                    "  Reconnect delay exponent: {}",
                    args.options.reconnect_delay_exponent
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Invalid connection settings");
                Err(e.into())
            }
        }
    }
}
