//! Agora CLI - Command-line tooling for Agora governance.
//!
//! Generates keys, computes and signs attestation digests, and replays
//! governance scenarios against in-process contracts.

pub mod commands;
pub mod config;
pub mod output;
pub mod scenario;
pub mod telemetry;

use clap::Parser;

fn main() {
    let cli = commands::Cli::parse();

    if let Err(e) = run(cli) {
        output::print_error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: commands::Cli) -> anyhow::Result<()> {
    let config = cli.resolve_config()?;
    telemetry::init_telemetry(&config.logging.level, config.logging.is_json())?;
    tracing::debug!(domain = %config.domain_separator, "Configuration loaded");

    commands::execute(cli.command, &config)
}
