//! System clock adapter.

use chrono::{DateTime, Utc};
use inkloom_ports::ClockPort;

/// Production clock backed by real wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Controllable clock for deterministic tests and the demo runner's
/// reproducible-seed mode.
pub struct FixedClock {
    frozen: std::sync::RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(frozen_time: DateTime<Utc>) -> Self {
        Self {
            frozen: std::sync::RwLock::new(frozen_time),
        }
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut time = self.frozen.write().unwrap_or_else(|p| p.into_inner());
        *time += duration;
    }
}

impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.frozen.read().unwrap_or_else(|p| p.into_inner())
    }
}
