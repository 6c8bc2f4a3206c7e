//! Summary command implementation.
//!
//! Each section loads independently: a failed query prints a warning and
//! the remaining sections still render.

use super::{format_count, resolve_filter};
use crate::cli::args::FilterArgs;
use crate::core::dashboard::Dashboard;
use crate::core::predicate::Predicate;
use crate::core::queries::{DailyCount, GroupCount, Summary};
use anyhow::Result;
use colored::Colorize;

const BAR_WIDTH: usize = 30;

/// Execute summary command.
pub fn run(
    dashboard: &Dashboard,
    filter: &FilterArgs,
    default_limit: u32,
    trend: bool,
    format: &str,
) -> Result<()> {
    let request = resolve_filter(filter, default_limit);
    let predicate = Predicate::build(&request);

    let summary = dashboard.summary(&predicate);
    let series = if trend {
        Some(dashboard.daily_counts(&predicate))
    } else {
        None
    };

    if format == "json" {
        #[derive(serde::Serialize)]
        struct JsonOutput<'a> {
            summary: Option<&'a Summary>,
            daily: Option<&'a Vec<DailyCount>>,
            errors: Vec<String>,
        }

        let mut errors = Vec::new();
        if let Err(e) = &summary {
            errors.push(format!("summary: {}", e));
        }
        if let Some(Err(e)) = &series {
            errors.push(format!("daily: {}", e));
        }
        let output = JsonOutput {
            summary: summary.as_ref().ok(),
            daily: series.as_ref().and_then(|s| s.as_ref().ok()),
            errors,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "Incident summary {} ~ {}",
            request.date_from, request.date_to
        )
        .bold()
        .cyan()
    );
    println!();

    match summary {
        Ok(summary) => print_kpis(&summary),
        Err(e) => {
            tracing::warn!("KPI query failed: {}", e);
            println!("{}", format!("[WARN] KPI loading error: {}", e).yellow());
        }
    }

    if let Some(series) = series {
        println!();
        match series {
            Ok(days) => print_series(&days),
            Err(e) => {
                tracing::warn!("Daily series query failed: {}", e);
                println!("{}", format!("[WARN] Trend loading error: {}", e).yellow());
            }
        }
    }

    Ok(())
}

fn print_kpis(summary: &Summary) {
    println!("  {:<14} {}", "Total:".bold(), format_count(summary.total));
    println!("  {:<14} {}", "Today:".bold(), format_count(summary.today));
    println!(
        "  {:<14} {} ({})",
        "Top category:".bold(),
        summary.top_category.value,
        format_count(summary.top_category.count)
    );
    println!();
    println!("{}", "By platform:".bold());
    if summary.by_platform.is_empty() {
        println!("  {}", "No data".dimmed());
        return;
    }
    print_bars(&summary.by_platform);
}

fn print_bars(groups: &[GroupCount]) {
    let max = groups.iter().map(|g| g.count).max().unwrap_or(0);
    let label_width = groups
        .iter()
        .map(|g| g.value.chars().count())
        .max()
        .unwrap_or(0)
        .min(20);
    for group in groups {
        println!(
            "  {:<width$} {} {}",
            crate::utils::text::truncate(&group.value, 20),
            bar(group.count, max).green(),
            format_count(group.count),
            width = label_width
        );
    }
}

fn print_series(days: &[DailyCount]) {
    println!("{}", "Per day:".bold());
    if days.is_empty() {
        println!("  {}", "No data".dimmed());
        return;
    }
    let max = days.iter().map(|d| d.count).max().unwrap_or(0);
    for day in days {
        println!(
            "  {} {} {}",
            day.day,
            bar(day.count, max).blue(),
            format_count(day.count)
        );
    }
}

/// Horizontal bar scaled to the largest value.
fn bar(value: i64, max: i64) -> String {
    if max <= 0 || value <= 0 {
        return String::new();
    }
    let len = ((value as f64 / max as f64) * BAR_WIDTH as f64).ceil() as usize;
    "#".repeat(len.clamp(1, BAR_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(10, 10).len(), BAR_WIDTH);
        assert_eq!(bar(5, 10).len(), BAR_WIDTH / 2);
        assert_eq!(bar(1, 1000).len(), 1);
        assert_eq!(bar(0, 10), "");
    }
}
