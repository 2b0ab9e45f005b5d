//! Annotation CLI
//!
//! Main entry point for the `annotation` binary.
//! Loads configuration, initializes logging and runs one subcommand.

mod attach;
mod config;
mod telemetry;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

use attach::AttachArgs;
use config::AppConfig;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "annotation",
    author,
    version,
    about = "Manage annotations of artifacts stored in an OCI registry",
    long_about = None
)]
struct Cli {
    /// Configuration directory
    #[arg(long, global = true, env = "CONFIG_DIR", default_value = "config")]
    config_dir: String,

    /// Log level
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Attach annotations to an artifact already stored in a registry
    Attach(AttachArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version are not failures
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let mut config = AppConfig::load_or_default(&cli.config_dir);
    if let Some(log_level) = cli.log_level {
        config.logging.level = log_level;
    }

    telemetry::init_with_config(telemetry::TelemetryConfig::from(&config.logging));

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Attach(args) => attach::execute(args, config).await,
    }
}
