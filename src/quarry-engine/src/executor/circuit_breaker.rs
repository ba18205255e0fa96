//! Cooperative cancellation.
//!
//! Operators call [`CircuitBreaker::check`] inside every loop whose length
//! depends on data. A tripped breaker fails the call with
//! [`QuarryError::QueryCancelled`] or [`QuarryError::QueryTimedOut`], which
//! callers propagate with `?` and never swallow.

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, AtomicU8, AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use common_error::{QuarryError, QuarryResult};
use tokio::sync::watch;

use crate::executor::clock::MicrosecondClock;

// ============================================================================
// Cancellation flag
// ============================================================================

/// Read side of a cancellation signal, installed into breakers.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    rx: Option<watch::Receiver<bool>>,
}

impl CancellationFlag {
    /// Flag that is never raised.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Whether cancellation was requested.
    pub fn is_set(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

/// Handle for cancelling a query from outside its driving thread.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    cancel_tx: watch::Sender<bool>,
}

impl CancellationHandle {
    /// Create a handle and the flag it controls.
    pub fn new() -> (Self, CancellationFlag) {
        let (tx, rx) = watch::channel(false);
        (Self { cancel_tx: tx }, CancellationFlag { rx: Some(rx) })
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    /// Check if cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }
}

// ============================================================================
// Breaker trait
// ============================================================================

/// Cooperative cancellation primitive shared by one query's operator tree.
pub trait CircuitBreaker: Send + Sync + Debug {
    /// Fail if the query was cancelled or ran out of time.
    ///
    /// Once this returns an error every later call returns an error too,
    /// until [`reset_timer`](Self::reset_timer).
    fn check(&self) -> QuarryResult<()>;

    /// Whether the breaker would fail now. Not throttled.
    fn is_tripped(&self) -> bool;

    /// Install the flag polled by [`check`](Self::check).
    fn set_cancelled_flag(&self, flag: CancellationFlag);

    /// Restart the time budget and clear the tripped state.
    fn reset_timer(&self);
}

const STATE_OK: u8 = 0;
const STATE_CANCELLED: u8 = 1;
const STATE_TIMED_OUT: u8 = 2;

/// Sticky tripped state plus the installed flag.
#[derive(Debug, Default)]
struct TripState {
    state: AtomicU8,
    flag: RwLock<CancellationFlag>,
}

impl TripState {
    fn flag_is_set(&self) -> bool {
        self.flag
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_set()
    }

    fn set_flag(&self, flag: CancellationFlag) {
        *self.flag.write().unwrap_or_else(PoisonError::into_inner) = flag;
    }

    fn trip(&self, state: u8) {
        if self.state.swap(state, Ordering::AcqRel) == STATE_OK {
            match state {
                STATE_CANCELLED => log::info!("circuit breaker tripped: query cancelled"),
                _ => log::info!("circuit breaker tripped: query timed out"),
            }
        }
    }

    fn error(&self, timeout_micros: i64) -> Option<QuarryError> {
        match self.state.load(Ordering::Acquire) {
            STATE_CANCELLED => Some(QuarryError::cancelled("cancelled by user")),
            STATE_TIMED_OUT => Some(QuarryError::timed_out(timeout_micros)),
            _ => None,
        }
    }

    fn is_tripped(&self) -> bool {
        self.state.load(Ordering::Acquire) != STATE_OK
    }

    fn reset(&self) {
        self.state.store(STATE_OK, Ordering::Release);
    }
}

// ============================================================================
// Noop
// ============================================================================

/// Breaker that never trips.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCircuitBreaker;

impl CircuitBreaker for NoopCircuitBreaker {
    fn check(&self) -> QuarryResult<()> {
        Ok(())
    }

    fn is_tripped(&self) -> bool {
        false
    }

    fn set_cancelled_flag(&self, _flag: CancellationFlag) {}

    fn reset_timer(&self) {}
}

// ============================================================================
// Flag-only breaker
// ============================================================================

/// Lightweight breaker that only watches the cancellation flag.
///
/// The flag is polled on the first check and then once every `throttle`
/// checks.
#[derive(Debug)]
pub struct AtomicBooleanCircuitBreaker {
    throttle: u32,
    counter: AtomicU32,
    trip: TripState,
}

impl AtomicBooleanCircuitBreaker {
    /// Create a breaker polling its flag every `throttle` checks.
    pub fn new(throttle: u32) -> Self {
        Self {
            throttle: throttle.max(1),
            counter: AtomicU32::new(0),
            trip: TripState::default(),
        }
    }
}

impl Default for AtomicBooleanCircuitBreaker {
    fn default() -> Self {
        Self::new(1)
    }
}

impl CircuitBreaker for AtomicBooleanCircuitBreaker {
    fn check(&self) -> QuarryResult<()> {
        if let Some(err) = self.trip.error(0) {
            return Err(err);
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        if n % self.throttle == 0 && self.trip.flag_is_set() {
            self.trip.trip(STATE_CANCELLED);
            return Err(QuarryError::cancelled("cancelled by user"));
        }
        Ok(())
    }

    fn is_tripped(&self) -> bool {
        self.trip.is_tripped() || self.trip.flag_is_set()
    }

    fn set_cancelled_flag(&self, flag: CancellationFlag) {
        self.trip.set_flag(flag);
    }

    fn reset_timer(&self) {
        self.counter.store(0, Ordering::Relaxed);
        self.trip.reset();
    }
}

// ============================================================================
// Full breaker
// ============================================================================

/// Breaker enforcing both the cancellation flag and a time budget.
///
/// The flag is polled on every check. The clock is read once every
/// `throttle` checks, and never when the budget is zero or negative.
#[derive(Debug)]
pub struct QueryCircuitBreaker {
    clock: Arc<dyn MicrosecondClock>,
    throttle: u32,
    timeout_micros: i64,
    started_at: AtomicI64,
    counter: AtomicU32,
    trip: TripState,
}

impl QueryCircuitBreaker {
    /// Create a breaker; the budget starts counting at construction.
    pub fn new(clock: Arc<dyn MicrosecondClock>, throttle: u32, timeout_micros: i64) -> Self {
        let started_at = AtomicI64::new(clock.ticks());
        Self {
            clock,
            throttle: throttle.max(1),
            timeout_micros,
            started_at,
            counter: AtomicU32::new(0),
            trip: TripState::default(),
        }
    }

    /// Time budget in microseconds; zero or less means unlimited.
    pub fn timeout_micros(&self) -> i64 {
        self.timeout_micros
    }

    fn timed_out(&self) -> bool {
        let elapsed = self.clock.ticks() - self.started_at.load(Ordering::Relaxed);
        elapsed > self.timeout_micros
    }
}

impl CircuitBreaker for QueryCircuitBreaker {
    fn check(&self) -> QuarryResult<()> {
        if let Some(err) = self.trip.error(self.timeout_micros) {
            return Err(err);
        }
        if self.trip.flag_is_set() {
            self.trip.trip(STATE_CANCELLED);
            return Err(QuarryError::cancelled("cancelled by user"));
        }
        if self.timeout_micros > 0 {
            let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
            if n >= self.throttle {
                self.counter.store(0, Ordering::Relaxed);
                if self.timed_out() {
                    self.trip.trip(STATE_TIMED_OUT);
                    return Err(QuarryError::timed_out(self.timeout_micros));
                }
            }
        }
        Ok(())
    }

    fn is_tripped(&self) -> bool {
        self.trip.is_tripped()
            || self.trip.flag_is_set()
            || (self.timeout_micros > 0 && self.timed_out())
    }

    fn set_cancelled_flag(&self, flag: CancellationFlag) {
        self.trip.set_flag(flag);
    }

    fn reset_timer(&self) {
        self.started_at.store(self.clock.ticks(), Ordering::Relaxed);
        self.counter.store(0, Ordering::Relaxed);
        self.trip.reset();
    }
}

// ============================================================================
// Tests
// ============================================================================
