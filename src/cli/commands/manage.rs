//! Add, edit and delete command implementations.

use crate::cli::args::IncidentArgs;
use crate::core::dashboard::Dashboard;
use crate::core::mutations;
use crate::models::incident::IncidentDraft;
use anyhow::Result;
use colored::Colorize;

/// Execute add command.
pub fn add(dashboard: &mut Dashboard, fields: IncidentArgs) -> Result<()> {
    let draft = IncidentDraft::from_input(fields.into())?;
    warn_if_ends_early(&draft);

    let id = dashboard.add(&draft)?;
    println!("{} incident #{}", "[OK] Saved".green(), id);
    Ok(())
}

/// Execute edit command.
pub fn edit(dashboard: &mut Dashboard, id: i64, fields: IncidentArgs) -> Result<()> {
    let draft = IncidentDraft::from_input(fields.into())?;
    warn_if_ends_early(&draft);

    dashboard.edit(id, &draft)?;
    println!("{} incident #{}", "[OK] Updated".green(), id);
    Ok(())
}

/// Execute delete command.
pub fn delete(dashboard: &mut Dashboard, raw_ids: &[String]) -> Result<()> {
    let ids = mutations::parse_id_entries(raw_ids)?;
    if ids.is_empty() {
        anyhow::bail!("No IDs given. Enter at least one, e.g. 101,102,120");
    }

    let removed = dashboard.delete(&ids)?;
    println!(
        "{} {} of {} incidents",
        "[OK] Deleted".green(),
        removed,
        ids.len()
    );
    if removed < ids.len() {
        println!(
            "{}",
            format!("[WARN] {} IDs did not exist", ids.len() - removed).yellow()
        );
    }
    Ok(())
}

fn warn_if_ends_early(draft: &IncidentDraft) {
    if draft.ends_before_start() {
        println!(
            "{}",
            "[WARN] End time is before start time; saving anyway".yellow()
        );
    }
}
