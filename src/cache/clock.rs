//! Time source for TTL bookkeeping.

use std::fmt;
use std::time::Instant;

#[cfg(any(test, feature = "mock"))]
use std::sync::Arc;
#[cfg(any(test, feature = "mock"))]
use std::time::Duration;

/// Monotonic clock consulted by the session cache.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

/// Reads [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<parking_lot::Mutex<Instant>>,
}

#[cfg(any(test, feature = "mock"))]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(parking_lot::Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

#[cfg(any(test, feature = "mock"))]
impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "mock"))]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}
