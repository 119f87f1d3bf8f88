//! Time sources and calendar-day arithmetic.

use chrono::{DateTime, Duration, FixedOffset, Local};
use std::sync::Mutex;

/// Source of the current time, in the user's local offset.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the system's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Clock that only moves when told to. Used by tests and host previews.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: DateTime<FixedOffset>) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }

    /// Move forward (or back, for a negative duration).
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now = *now + by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Whole calendar days from `start` to `end`.
///
/// Both instants are read as dates in `end`'s offset and the dates are
/// subtracted, so 23:59 and 00:01 the next day are one day apart. Negative
/// when `end` falls on an earlier date than `start`.
pub fn days_between(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> i64 {
    let start_day = start.with_timezone(&end.timezone()).date_naive();
    (end.date_naive() - start_day).num_days()
}
