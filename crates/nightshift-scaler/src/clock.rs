//! Injectable wall clock
//!
//! Schedule evaluation and the barrier-bypass timeout both consume wall
//! time. Routing it through a trait keeps those paths deterministic under
//! test.

use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// Source of "now" for schedule evaluation and timeout checks.
pub trait Clock: Send + Sync {
    /// Current instant in UTC
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current wall time in the operator's local timezone.
    ///
    /// Used when a schedule declares no timezone (or an unknown one).
    fn now_local(&self) -> NaiveDateTime;
}

/// Production clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to a fixed instant, for tests.
///
/// `now_local()` reports the same wall time as the UTC instant, i.e. the
/// simulated operator runs in UTC.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }

    fn now_local(&self) -> NaiveDateTime {
        self.0.naive_utc()
    }
}
