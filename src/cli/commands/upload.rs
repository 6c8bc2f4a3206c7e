//! Upload command implementation.

use crate::core::dashboard::Dashboard;
use crate::core::upload;
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Execute upload command.
pub fn run(dashboard: &mut Dashboard, file: &Path) -> Result<()> {
    println!("{}", "[UPLOAD] Reading file...".bold().cyan());
    println!("  File: {}", file.display());

    let batch = upload::read_upload(file)
        .with_context(|| format!("Upload rejected: {}", file.display()))?;

    println!("  Rows: {}", batch.rows.len());
    if !batch.ignored_columns.is_empty() {
        println!(
            "  {} {}",
            "Ignored columns:".yellow(),
            batch.ignored_columns.join(", ")
        );
    }
    if !batch.missing_columns.is_empty() {
        println!(
            "  Empty columns: {}",
            batch.missing_columns.join(", ")
        );
    }
    if batch.unparsed_timestamps > 0 || batch.unparsed_counts > 0 {
        println!(
            "  {}",
            format!(
                "[WARN] {} timestamps and {} inquiry counts could not be read and are left empty",
                batch.unparsed_timestamps, batch.unparsed_counts
            )
            .yellow()
        );
    }
    println!();

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Writing {} incidents...", batch.rows.len()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = dashboard.upload(&batch);
    pb.finish_and_clear();

    let written = result.context("Upload failed, nothing was written")?;
    println!("{} {} incidents", "[OK] Uploaded".green(), written);
    Ok(())
}
