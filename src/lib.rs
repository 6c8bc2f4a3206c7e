//! Incident Board Library
//!
//! Filtering, summarizing and maintaining a table of service incidents.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod preflight;
pub mod utils;

pub use error::{Error, Result};
