//! Facets command implementation.

use crate::core::dashboard::Dashboard;
use crate::models::incident::CategoricalField;
use anyhow::Result;
use colored::Colorize;

/// Print the distinct values of every categorical field.
pub fn run(dashboard: &Dashboard, format: &str) -> Result<()> {
    let facets = dashboard.facets()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&facets)?);
        return Ok(());
    }

    for field in CategoricalField::ALL {
        let values = facets.values(field);
        println!("{} ({})", field.to_string().bold(), values.len());
        if values.is_empty() {
            println!("  {}", "(none)".dimmed());
        }
        for value in values {
            println!("  {}", value);
        }
    }
    Ok(())
}
