//! Time source injected into everything that stamps or ages records.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Offset of the calendar the original product was built for (UTC+07:00).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// Source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Calendar day of `now` at a fixed UTC offset.
///
/// Offsets outside ±23h fall back to UTC.
pub fn local_today(now: DateTime<Utc>, utc_offset_hours: i32) -> NaiveDate {
    match utc_offset_hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
    {
        Some(offset) => now.with_timezone(&offset).date_naive(),
        None => now.date_naive(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn local_today_crosses_midnight_forward() {
        // 18:30 UTC is already the next day at +07:00.
        let now = Utc.with_ymd_and_hms(2024, 5, 31, 18, 30, 0).unwrap();
        assert_eq!(
            local_today(now, DEFAULT_UTC_OFFSET_HOURS),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert_eq!(
            local_today(now, 0),
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()
        );
    }

    #[test]
    fn invalid_offset_falls_back_to_utc() {
        let now = Utc.with_ymd_and_hms(2024, 5, 31, 18, 30, 0).unwrap();
        assert_eq!(local_today(now, 99), now.date_naive());
        assert_eq!(local_today(now, i32::MAX), now.date_naive());
        assert_eq!(local_today(now, i32::MIN), now.date_naive());
    }

    #[test]
    fn fixed_clock_is_frozen() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let clock = FixedClock(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), clock.now());
    }
}
