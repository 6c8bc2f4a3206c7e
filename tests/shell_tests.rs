//! Integration tests for the shell session.
//!
//! Tests cover:
//! - Repeated reads served from the cache
//! - Writes clearing the cache mid-session
//! - Bad lines not ending the session

mod common;

use common::seeded_store;
use incident_board::cli::commands::shell::{self, ShellReport};
use incident_board::core::dashboard::Dashboard;
use incident_board::models::config::CacheConfig;
use std::io::Cursor;

fn dashboard() -> Dashboard {
    Dashboard::new(seeded_store(), &CacheConfig::default())
}

#[test]
fn test_repeated_read_is_cached_until_write() {
    let mut dash = dashboard();
    let script = "\
summary --from 2024-03-01 --to 2024-03-31
summary --from 2024-03-01 --to 2024-03-31
add --started-at \"2024-03-20 12:00\" --category Outage --description \"CDN down\"
list --from 2024-03-01 --to 2024-03-31 --format simple
";

    let report = shell::run(&mut dash, 500, Cursor::new(script), false).unwrap();
    assert_eq!(
        report,
        ShellReport {
            succeeded: 4,
            failed: 0
        }
    );

    let stats = dash.cache().stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    // Only the list read made after the insert remains.
    assert_eq!(stats.entries, 1);
    assert_eq!(dash.store().row_count().unwrap(), 5);
}

#[test]
fn test_bad_lines_do_not_end_session() {
    let mut dash = dashboard();
    let script = "\
# comment

bogus
show 999
delete 1,2
shell
exit
delete 3
";

    let report = shell::run(&mut dash, 500, Cursor::new(script), false).unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 3);
    // Lines after `exit` are not run.
    assert_eq!(dash.store().row_count().unwrap(), 2);
}
