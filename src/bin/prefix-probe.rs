//! prefix-probe CLI Binary
//!
//! Command-line interface for discovering secrets through a prefix oracle.

use clap::Parser;
use prefix_probe::cli::{map_error, Cli, RunContext};
use prefix_probe::config::ProbeConfig;
use prefix_probe::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let context = match RunContext::load(cli.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    // Build logging config from CLI args and the loaded configuration
    let logging_config = build_logging_config(&cli, context.config());
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("prefix-probe starting");

    match context.execute(&cli.command).await {
        Ok(output) => {
            info!(exit_code = output.exit_code, "Command completed");
            println!("{}", output.text);
            if output.exit_code != 0 {
                process::exit(output.exit_code);
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args and the config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, config: &ProbeConfig) -> LoggingConfig {
    let mut logging = config.logging.clone();

    if cli.quiet {
        logging.level = "off".to_string();
    }
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }

    logging
}
