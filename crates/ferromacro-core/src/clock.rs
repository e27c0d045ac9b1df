//! Time source used for cache freshness and default date windows.

use std::sync::{Mutex, PoisonError};

use time::{Date, Duration};

use crate::UtcDateTime;

/// Supplies the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> UtcDateTime;

    /// Calendar date of [`now`](Clock::now) in UTC.
    fn today(&self) -> Date {
        self.now().date()
    }
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UtcDateTime {
        UtcDateTime::now()
    }
}

/// Hand-driven clock for deterministic TTL tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<UtcDateTime>,
}

impl ManualClock {
    pub fn new(start: UtcDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.saturating_add(by);
    }

    pub fn set(&self, to: UtcDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UtcDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
