/// Time source for date filters.
///
/// Date filter operands are day offsets from the start of "today", so the
/// grid needs to know what today is. Production code uses `SystemClock`;
/// tests pin the date with `FixedClock`.

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};

/// Milliseconds in one day.
pub const DAY_MS: f64 = 86_400_000.0;

pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Start of the day containing `now`, as epoch milliseconds.
///
/// With `utc` the day boundary is UTC midnight, otherwise local midnight.
pub fn start_of_day_ms(now: DateTime<Utc>, utc: bool) -> f64 {
    if utc {
        let midnight = now.date_naive().and_time(NaiveTime::MIN);
        return Utc.from_utc_datetime(&midnight).timestamp_millis() as f64;
    }

    let local_midnight = now.with_timezone(&Local).date_naive().and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&local_midnight).earliest() {
        Some(start) => start.timestamp_millis() as f64,
        // Midnight skipped by a DST jump: fall back to the UTC boundary.
        None => Utc.from_utc_datetime(&local_midnight).timestamp_millis() as f64,
    }
}
