//! Shell command implementation.
//!
//! Reads one command per line and runs it against a single dashboard, so
//! repeated reads are served from the read cache until a write clears it.

use super::dispatch;
use crate::cli::args::Cli;
use crate::core::dashboard::Dashboard;
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::io::{BufRead, Write};

/// Outcome of a shell session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShellReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Execute shell command.
///
/// Blank lines and `#` comments are skipped; `exit` or `quit` ends the
/// session, as does end of input. A failing line is reported and the
/// session continues.
pub fn run<R: BufRead>(
    dashboard: &mut Dashboard,
    default_limit: u32,
    input: R,
    interactive: bool,
) -> Result<ShellReport> {
    let mut report = ShellReport::default();
    if interactive {
        println!(
            "{}",
            "Incident board shell. Type a command (e.g. `summary --trend`), `stats` or `exit`."
                .dimmed()
        );
        prompt()?;
    }

    for line in input.lines() {
        let line = line?;
        let line = line.trim();

        match line {
            "" => {}
            _ if line.starts_with('#') => {}
            "exit" | "quit" => break,
            "stats" => {
                let stats = dashboard.cache().stats();
                println!(
                    "Cache: {} entries, {} hits, {} misses",
                    stats.entries, stats.hits, stats.misses
                );
            }
            _ => match run_line(dashboard, default_limit, line) {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::debug!("Shell line failed: {}", line);
                    println!("{} {:#}", "[ERROR]".red(), e);
                }
            },
        }

        if interactive {
            prompt()?;
        }
    }

    tracing::info!(
        "Shell session ended: {} succeeded, {} failed",
        report.succeeded,
        report.failed
    );
    Ok(report)
}

fn run_line(dashboard: &mut Dashboard, default_limit: u32, line: &str) -> Result<()> {
    let words = split_words(line)?;
    let cli = Cli::try_parse_from(std::iter::once("incident-board".to_string()).chain(words))?;
    dispatch(dashboard, cli.command, default_limit)
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}

/// Split a line into words, honoring single and double quotes.
fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        anyhow::bail!("Unterminated {} quote", q);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
