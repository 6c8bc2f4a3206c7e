//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use incident_board::core::mutations;
use incident_board::core::store::IncidentStore;
use incident_board::models::filter::FilterRequest;
use incident_board::models::incident::{IncidentDraft, IncidentInput};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn draft(started_at: &str, platform: &str, category: &str, description: &str) -> IncidentDraft {
    IncidentDraft::from_input(IncidentInput {
        started_at: started_at.to_string(),
        platform: Some(platform.to_string()),
        locale: Some("en-US".to_string()),
        category: category.to_string(),
        description: description.to_string(),
        ..Default::default()
    })
    .unwrap()
}

/// A store with four incidents in March 2024.
pub fn seeded_store() -> IncidentStore {
    let mut store = IncidentStore::open_in_memory().unwrap();
    let conn = store.conn_mut();
    for d in [
        draft("2024-03-01 09:00", "iOS", "Login", "Users cannot sign in"),
        draft("2024-03-02 14:30", "Android", "Payment", "Card payment timeout"),
        draft("2024-03-02 18:00", "iOS", "Login", "Password reset mail delayed"),
        draft("2024-03-05 23:59", "Web", "Outage", "Site returned 50% errors"),
    ] {
        mutations::insert(conn, &d).unwrap();
    }
    store
}

pub fn march() -> FilterRequest {
    let mut filter = FilterRequest::ending_on(day(2024, 3, 31));
    filter.date_from = day(2024, 3, 1);
    filter
}
