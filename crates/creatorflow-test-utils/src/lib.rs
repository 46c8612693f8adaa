//! Shared test utilities for CreatorFlow integration tests.
//!
//! Provides deterministic fixtures (channels, products, tasks) anchored to a
//! fixed instant, plus temporary on-disk stores that clean up after
//! themselves.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use creatorflow_store::JsonFileStore;
use creatorflow_store::models::{ChannelName, ClockTime, Priority, Product, Task};

/// Instant all fixtures are anchored to: 2024-06-01 03:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 3, 0, 0)
        .single()
        .expect("fixture instant is valid")
}

/// Calendar day used by scheduling fixtures.
pub fn plan_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("fixture date is valid")
}

/// Parse a channel name, panicking on blank input (test-only helper).
pub fn channel(name: &str) -> ChannelName {
    ChannelName::parse(name).unwrap_or_else(|e| panic!("bad fixture channel {name:?}: {e}"))
}

/// Parse a clock time, panicking on invalid input (test-only helper).
pub fn clock(raw: &str) -> ClockTime {
    raw.parse()
        .unwrap_or_else(|e| panic!("bad fixture clock time {raw:?}: {e}"))
}

/// A product created `created_days_ago` days before [`fixed_now`], optionally
/// last scheduled `scheduled_days_ago` days before it.
pub fn product(
    id: &str,
    name: &str,
    channel_name: &str,
    created_days_ago: i64,
    scheduled_days_ago: Option<i64>,
) -> Product {
    let now = fixed_now();
    Product {
        id: id.to_owned(),
        name: name.to_owned(),
        description: format!("{name} description"),
        channel: channel(channel_name),
        sub_category: None,
        image: None,
        tags: vec!["review".to_owned()],
        created_at: now - Duration::days(created_days_ago),
        last_scheduled_at: scheduled_days_ago.map(|d| now - Duration::days(d)),
    }
}

/// A pending task on [`plan_date`].
pub fn task(id: &str, title: &str, channel_name: &str, start: &str) -> Task {
    Task {
        id: id.to_owned(),
        title: title.to_owned(),
        channel: channel(channel_name),
        date: plan_date(),
        start_time: clock(start),
        duration: 60,
        is_completed: false,
        priority: Priority::Medium,
        notes: None,
        notion_synced: None,
        product_id: None,
    }
}

/// A [`JsonFileStore`] rooted in a fresh temporary directory.
///
/// Keep the returned [`TempDir`] alive for as long as the store is used.
pub fn temp_file_store() -> (JsonFileStore, TempDir) {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
    let store = JsonFileStore::new(dir.path().join("data"));
    (store, dir)
}
