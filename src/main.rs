use boomerang_socket::cli::{Cli, Commands};
use boomerang_socket::config::Config;
use clap::Parser;

// Single-threaded: socket tasks only run once a command yields, so listeners
// added right after connecting see the first `open`.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    let _telemetry = boomerang_socket::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Connect(args) => {
            tracing::info!("Starting connection");
            args.execute(&config.connection).await?;
        }
        Commands::Validate(args) => {
            args.execute(&config.connection)?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Url: {}", config.connection.url);
            match &config.connection.protocols {
                Some(protocols) => println!("  Protocols: {}", protocols),
                None => println!("  Protocols: none"),
            }
            match &config.connection.options {
                Some(options) => println!("  Options: {}", options),
                None => println!("  Options: defaults"),
            }
            println!(
                "  Telemetry: level={}, format={:?}, metrics_port={:?}",
                config.telemetry.log_level,
                config.telemetry.log_format,
                config.telemetry.metrics_port
            );
        }
    }

    Ok(())
}
