//! Init command implementation.

use crate::core::dashboard::Dashboard;
use anyhow::Result;
use colored::Colorize;

/// Report the database location; the schema is created when the store opens.
pub fn run(dashboard: &Dashboard) -> Result<()> {
    let store = dashboard.store();
    println!("{}", "[INIT] Incident database ready".bold().green());
    println!("  Location: {}", store.target());
    println!("  Incidents: {}", super::format_count(store.row_count()?));
    Ok(())
}
