//! CLI command implementations.

pub mod facets;
pub mod init;
pub mod list;
pub mod manage;
pub mod shell;
pub mod summary;
pub mod upload;

use crate::cli::args::{Commands, FilterArgs};
use crate::core::dashboard::Dashboard;
use crate::models::filter::FilterRequest;
use anyhow::Result;
use colored::Colorize;

/// Run one parsed command against a dashboard.
pub fn dispatch(dashboard: &mut Dashboard, command: Commands, default_limit: u32) -> Result<()> {
    match command {
        Commands::Init => init::run(dashboard),

        Commands::Summary {
            filter,
            trend,
            format,
        } => summary::run(dashboard, &filter, default_limit, trend, &format),

        Commands::List { filter, format } => list::run(dashboard, &filter, default_limit, &format),

        Commands::Show { id } => list::show(dashboard, id),

        Commands::Facets { format } => facets::run(dashboard, &format),

        Commands::Add { fields } => manage::add(dashboard, fields),

        Commands::Edit { id, fields } => manage::edit(dashboard, id, fields),

        Commands::Delete { ids } => manage::delete(dashboard, &ids),

        Commands::Upload { file } => upload::run(dashboard, &file),

        Commands::Shell => anyhow::bail!("Already in a shell session"),
    }
}

/// Build the filter request for a read command, announcing any date fix-up.
pub fn resolve_filter(args: &FilterArgs, default_limit: u32) -> FilterRequest {
    let mut request = args.to_request(default_limit);
    if request.correct_dates() {
        println!(
            "{}",
            format!(
                "[WARN] End date was before start date; showing {} only",
                request.date_from
            )
            .yellow()
        );
    }
    request
}

/// Format a count with thousands separators.
pub fn format_count(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        format!("-{}", out)
    } else {
        out
    }
}
