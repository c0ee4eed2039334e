//! Clock port — the one piece of ambient nondeterminism the engine is
//! allowed to depend on, grounded on the teacher's `clock_port.rs`: tests
//! substitute a `FixedClock` so hash/timestamp-adjacent assertions stay
//! deterministic.

use chrono::{DateTime, Utc};

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
