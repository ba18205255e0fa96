//! Microsecond clocks.

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of microsecond timestamps.
pub trait MicrosecondClock: Send + Sync + Debug {
    /// Microseconds since the Unix epoch.
    fn ticks(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl MicrosecondClock for SystemClock {
    fn ticks(&self) -> i64 {
        chrono::Utc::now().timestamp_micros()
    }
}

/// Clock that only moves when told to. Used for deterministic replay and
/// timeout tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock reading `now`.
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Set the current reading.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward.
    pub fn advance(&self, micros: i64) {
        self.now.fetch_add(micros, Ordering::SeqCst);
    }
}

impl MicrosecondClock for ManualClock {
    fn ticks(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.ticks() > 1_577_836_800_000_000);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.ticks(), 10);
        clock.advance(5);
        assert_eq!(clock.ticks(), 15);
        clock.set(3);
        assert_eq!(clock.ticks(), 3);
    }
}
