//! List and show command implementations.

use super::{format_count, resolve_filter};
use crate::cli::args::FilterArgs;
use crate::core::dashboard::Dashboard;
use crate::core::predicate::Predicate;
use crate::models::incident::{Incident, IncidentListRow};
use crate::utils::text::truncate;
use crate::utils::time;
use crate::Error;
use anyhow::Result;
use colored::Colorize;

/// Execute list command.
pub fn run(dashboard: &Dashboard, filter: &FilterArgs, default_limit: u32, format: &str) -> Result<()> {
    let request = resolve_filter(filter, default_limit);
    let predicate = Predicate::build(&request);
    let rows = dashboard.list(&predicate, request.row_limit())?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
        "simple" => print_simple(&rows),
        _ => print_table(&rows),
    }

    Ok(())
}

/// Print rows one per line.
fn print_simple(rows: &[IncidentListRow]) {
    if rows.is_empty() {
        println!("No incidents match the filters.");
        return;
    }
    for row in rows {
        println!(
            "#{} [{}] {} {}/{} - {}",
            row.id,
            row.started_at,
            row.category,
            row.platform.as_deref().unwrap_or("-"),
            row.locale.as_deref().unwrap_or("-"),
            truncate(&row.description, 80)
        );
    }
}

/// Print rows as a table.
fn print_table(rows: &[IncidentListRow]) {
    if rows.is_empty() {
        println!("{}", "No incidents match the filters.".yellow());
        return;
    }

    println!(
        "{}",
        format!("Found {} incidents:", format_count(rows.len() as i64))
            .bold()
            .cyan()
    );
    println!();
    println!(
        " {:>6} | {:<16} | {:<16} | {:<10} | {:<8} | {:<12} | {}",
        "ID", "Started", "Ended", "Platform", "Locale", "Category", "Description"
    );
    println!("{}", "-".repeat(110));

    for row in rows {
        println!(
            " {:>6} | {:<16} | {:<16} | {:<10} | {:<8} | {:<12} | {}",
            row.id,
            row.started_at,
            row.ended_at,
            truncate(row.platform.as_deref().unwrap_or("-"), 10),
            truncate(row.locale.as_deref().unwrap_or("-"), 8),
            truncate(&row.category, 12),
            truncate(&row.description, 40)
        );
    }
    println!();
    println!("{}", "Use `incident-board show <ID>` for details.".dimmed());
}

/// Execute show command.
pub fn show(dashboard: &Dashboard, id: i64) -> Result<()> {
    let incident = dashboard.incident(id)?.ok_or(Error::NotFound(id))?;
    print_detail(&incident);
    Ok(())
}

fn print_detail(incident: &Incident) {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();

    println!("{} {}", "Incident".bold().cyan(), format!("#{}", incident.id).bold());
    println!();
    println!("  {:<18} {}", "Category:".bold(), incident.category);
    println!(
        "  {:<18} {} / {}",
        "Platform/Locale:".bold(),
        opt(&incident.platform),
        opt(&incident.locale)
    );
    println!("  {:<18} {}", "Started:".bold(), time::format_stored(&incident.started_at));
    println!(
        "  {:<18} {}",
        "Ended:".bold(),
        incident
            .ended_at
            .as_ref()
            .map(time::format_stored)
            .unwrap_or_default()
    );
    println!("  {:<18} {}", "Duration:".bold(), opt(&incident.duration));
    println!(
        "  {:<18} {}",
        "Inquiries:".bold(),
        incident
            .inquiry_count
            .map(format_count)
            .unwrap_or_default()
    );
    println!("  {:<18} {}", "Created:".bold(), time::format_stored(&incident.created_at));
    println!("  {:<18} {}", "Updated:".bold(), time::format_stored(&incident.updated_at));

    if incident.ended_at.is_some_and(|end| end < incident.started_at) {
        println!("  {}", "[WARN] ends before it starts".yellow());
    }

    let sections = [
        ("Description", Some(&incident.description)),
        ("Cause", incident.cause.as_ref()),
        ("Response", incident.response.as_ref()),
        ("Note", incident.note.as_ref()),
    ];
    for (title, body) in sections {
        println!();
        println!("{}", title.bold());
        let body = body
            .map(|b| crate::utils::text::normalize_newlines(b))
            .unwrap_or_default();
        for line in body.lines() {
            println!("  {}", line);
        }
    }
}
