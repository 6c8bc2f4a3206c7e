//! Command line argument definitions.

use crate::models::filter::FilterRequest;
use crate::models::incident::IncidentInput;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Incident Board - Track and summarize service incidents
#[derive(Parser, Debug)]
#[command(name = "incident-board")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the secrets file with database settings
    #[arg(long, global = true, value_name = "PATH")]
    pub secrets: Option<PathBuf>,

    /// Skip preflight checks
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the incidents table and show where it lives
    Init,

    /// Show KPI summary: totals, today, top category, per platform
    Summary {
        #[command(flatten)]
        filter: FilterArgs,

        /// Also print incidents per day
        #[arg(long)]
        trend: bool,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// List incidents, newest first
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output format: table, simple, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show one incident in full
    Show {
        /// Incident ID
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// List the known platforms, locales and categories
    Facets {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Record a new incident
    Add {
        #[command(flatten)]
        fields: IncidentArgs,
    },

    /// Overwrite an existing incident
    Edit {
        /// Incident ID
        #[arg(value_name = "ID")]
        id: i64,

        #[command(flatten)]
        fields: IncidentArgs,
    },

    /// Delete incidents by ID (e.g. 101,102,120)
    Delete {
        /// IDs, comma or space separated
        #[arg(value_name = "IDS", num_args = 1..)]
        ids: Vec<String>,
    },

    /// Append incidents from a CSV/TSV file
    Upload {
        /// File with a header row
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Run commands read from stdin in one session; repeated reads are cached
    Shell,
}

/// Filter flags shared by the read commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// First day (YYYY-MM-DD), default 30 days ago
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD), default today
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Platforms to include (repeat or comma-separate)
    #[arg(long = "platform", value_delimiter = ',')]
    pub platforms: Vec<String>,

    /// Locales to include (repeat or comma-separate)
    #[arg(long = "locale", value_delimiter = ',')]
    pub locales: Vec<String>,

    /// Categories to include (repeat or comma-separate)
    #[arg(long = "category", value_delimiter = ',')]
    pub categories: Vec<String>,

    /// Search description, cause, response and note
    #[arg(short = 'k', long)]
    pub keyword: Option<String>,

    /// Maximum rows to list (50-5000)
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,
}

impl FilterArgs {
    /// Build a filter request, filling gaps with the defaults.
    pub fn to_request(&self, default_limit: u32) -> FilterRequest {
        let mut request = FilterRequest::default();
        if let Some(from) = self.from {
            request.date_from = from;
        }
        if let Some(to) = self.to {
            request.date_to = to;
        }
        request.platforms = self.platforms.clone();
        request.locales = self.locales.clone();
        request.categories = self.categories.clone();
        request.keyword = self.keyword.clone();
        request.limit = self.limit.unwrap_or(default_limit);
        request
    }
}

/// Incident fields for add/edit.
#[derive(Args, Debug, Clone)]
pub struct IncidentArgs {
    /// Start time (e.g. "2024-05-01 09:30")
    #[arg(long, value_name = "TIME")]
    pub started_at: String,

    /// End time
    #[arg(long, value_name = "TIME")]
    pub ended_at: Option<String>,

    /// Duration as free text (e.g. "1h 20m")
    #[arg(long)]
    pub duration: Option<String>,

    /// Affected platform
    #[arg(long)]
    pub platform: Option<String>,

    /// Affected locale
    #[arg(long)]
    pub locale: Option<String>,

    /// Number of customer inquiries
    #[arg(long)]
    pub inquiry_count: Option<i64>,

    /// Category
    #[arg(long)]
    pub category: String,

    /// What happened
    #[arg(long)]
    pub description: String,

    /// Root cause
    #[arg(long)]
    pub cause: Option<String>,

    /// Response taken
    #[arg(long)]
    pub response: Option<String>,

    /// Additional notes
    #[arg(long)]
    pub note: Option<String>,
}

impl From<IncidentArgs> for IncidentInput {
    fn from(args: IncidentArgs) -> Self {
        Self {
            started_at: args.started_at,
            ended_at: args.ended_at,
            duration: args.duration,
            platform: args.platform,
            locale: args.locale,
            inquiry_count: args.inquiry_count,
            category: args.category,
            description: args.description,
            cause: args.cause,
            response: args.response,
            note: args.note,
        }
    }
}
