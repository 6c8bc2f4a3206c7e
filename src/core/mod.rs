//! Core business logic modules.

pub mod cache;
pub mod dashboard;
pub mod mutations;
pub mod predicate;
pub mod queries;
pub mod store;
pub mod upload;
