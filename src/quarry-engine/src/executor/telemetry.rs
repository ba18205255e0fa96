//! Telemetry event hand-off.
//!
//! Persisting events is the sink's business; the execution core only
//! forwards them.

use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

/// Telemetry event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryEvent {
    /// A query ran to completion.
    QueryCompleted,
    /// A query was cancelled.
    QueryCancelled,
    /// A query exceeded its time budget.
    QueryTimedOut,
    /// A result was served from the cache.
    CacheHit,
}

/// Where a query came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryOrigin {
    /// Postgres wire protocol.
    PgWire,
    /// HTTP endpoint.
    Http,
    /// Engine-internal statement.
    Internal,
}

/// Destination for telemetry events.
pub trait TelemetrySink: Send + Sync + Debug {
    /// Store one event.
    fn store(&self, event: TelemetryEvent, origin: TelemetryOrigin);
}

/// Sink used when telemetry is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn store(&self, _event: TelemetryEvent, _origin: TelemetryOrigin) {}
}

/// Sink that queues events in memory until drained.
#[derive(Debug, Default)]
pub struct QueueTelemetry {
    events: Mutex<Vec<(TelemetryEvent, TelemetryOrigin)>>,
}

impl QueueTelemetry {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all queued events.
    pub fn drain(&self) -> Vec<(TelemetryEvent, TelemetryOrigin)> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetrySink for QueueTelemetry {
    fn store(&self, event: TelemetryEvent, origin: TelemetryOrigin) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event, origin));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_telemetry() {
        let queue = QueueTelemetry::new();
        queue.store(TelemetryEvent::QueryCompleted, TelemetryOrigin::PgWire);
        queue.store(TelemetryEvent::CacheHit, TelemetryOrigin::Http);
        assert_eq!(queue.len(), 2);

        let events = queue.drain();
        assert_eq!(events[0], (TelemetryEvent::QueryCompleted, TelemetryOrigin::PgWire));
        assert!(queue.is_empty());
    }
}
