//! Inventory aging: how long a product has waited since it was last put on
//! the calendar (or since it was created).
//!
//! Pure functions of `(reference, now)`; callers inject `now`.

use std::fmt;

use chrono::{DateTime, Utc};

use creatorflow_store::models::Product;

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Waiting time above which a product gets priority treatment.
pub const PRIORITY_AFTER_DAYS: i64 = 7;

/// Waiting time above which a product is urgent.
pub const URGENT_AFTER_DAYS: i64 = 14;

/// Staleness classification of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgingClass {
    /// Waited one week or less.
    Fresh,
    /// Waited more than one week, at most two.
    Priority,
    /// Waited more than two weeks.
    Urgent,
}

impl AgingClass {
    /// Classify a whole number of pending days.
    pub fn classify(days_pending: i64) -> Self {
        if days_pending > URGENT_AFTER_DAYS {
            Self::Urgent
        } else if days_pending > PRIORITY_AFTER_DAYS {
            Self::Priority
        } else {
            Self::Fresh
        }
    }

    /// Label written into the generation prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fresh => "Mới",
            Self::Priority => "Ưu tiên (Tồn > 1 tuần)",
            Self::Urgent => "CẦN XỬ LÝ GẤP (Tồn > 2 tuần)",
        }
    }
}

impl fmt::Display for AgingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fresh => "fresh",
            Self::Priority => "priority",
            Self::Urgent => "urgent",
        };
        f.write_str(s)
    }
}

/// Aging of a single product at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgingReport {
    pub days_pending: i64,
    pub class: AgingClass,
}

/// Whole days between `reference` and `now`, rounded up. Direction is ignored.
pub fn days_pending(reference: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (now - reference).num_milliseconds().abs();
    (millis + DAY_MILLIS - 1) / DAY_MILLIS
}

/// Age a product from its last-scheduled timestamp, or its creation time if
/// it was never scheduled.
pub fn evaluate(product: &Product, now: DateTime<Utc>) -> AgingReport {
    let days = days_pending(product.reference_timestamp(), now);
    AgingReport {
        days_pending: days,
        class: AgingClass::classify(days),
    }
}
