//! Incident Board CLI
//!
//! A command-line tool for tracking service incidents: KPI summaries,
//! filtered listings, edits and bulk uploads.

use clap::Parser;
use std::io::IsTerminal;
use incident_board::cli::{
    args::{Cli, Commands},
    commands::{self, shell},
};
use incident_board::core::{dashboard::Dashboard, store::IncidentStore};
use incident_board::models::config::{self, DbSettings};
use incident_board::preflight;

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Configuration and connectivity problems stop here, before any output
    let app_config = config::load_config();
    let settings = DbSettings::from_sources(cli.secrets.as_deref())?;
    let store = IncidentStore::open(&settings)?;

    if !cli.skip_preflight {
        run_preflight_checks(&settings, &store, cli.verbose)?;
    }

    let mut dashboard = Dashboard::new(store, &app_config.cache);
    let default_limit = app_config.list.default_limit;

    // Run the appropriate command
    match cli.command {
        Commands::Shell => {
            let interactive = std::io::stdin().is_terminal();
            let stdin = std::io::stdin().lock();
            shell::run(&mut dashboard, default_limit, stdin, interactive)?;
        }
        command => commands::dispatch(&mut dashboard, command, default_limit)?,
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("incident_board=debug")
    } else {
        EnvFilter::new("incident_board=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

/// Run preflight checks and exit if any fail.
fn run_preflight_checks(
    settings: &DbSettings,
    store: &IncidentStore,
    verbose: bool,
) -> anyhow::Result<()> {
    let results = preflight::run_preflight_checks(settings, store);
    let passed = preflight::all_passed(&results);

    if verbose || !passed {
        preflight::print_results(&results);
        println!();
    }

    if !passed {
        anyhow::bail!("Preflight checks failed. Fix the issues above and try again.");
    }

    Ok(())
}
