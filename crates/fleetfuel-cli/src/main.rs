//! Fleet Fuel Checker - fuel consumption control and logistics audit
//!
//! A CLI tool that reconciles fuel loads, trip distances and the vehicle
//! nomenclature, flags vehicles whose consumption deviates from their
//! model, and audits the logistics settlement sheet.

mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Debug for the workspace crates, warnings for everything else
const VERBOSE_FILTER: &str =
    "warn,fleetfuel_app=debug,fleetfuel_infra=debug,fleetfuel_domain=debug,fleetfuel_cli=debug";

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = commands::execute(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
