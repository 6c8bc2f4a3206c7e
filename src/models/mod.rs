//! Data models.

pub mod config;
pub mod filter;
pub mod incident;
