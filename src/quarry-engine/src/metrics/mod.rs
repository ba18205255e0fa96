//! Metrics collection for cursor execution.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Metrics for one drained cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorMetrics {
    /// Rows returned.
    pub rows_out: u64,
    /// Calls to `has_next`, including the final `false`.
    pub has_next_calls: u64,
    /// Time spent draining.
    pub exec_time: Duration,
    /// Whether the drain ended with an error.
    pub failed: bool,
}

impl CursorMetrics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows_out: 0,
            has_next_calls: 0,
            exec_time: Duration::new(0, 0),
            failed: false,
        }
    }

    pub fn add_row(&mut self) {
        self.rows_out += 1;
    }

    pub fn add_call(&mut self) {
        self.has_next_calls += 1;
    }

    pub fn add_time(&mut self, duration: Duration) {
        self.exec_time += duration;
    }

    /// Rows per second over `exec_time`.
    pub fn throughput(&self) -> f64 {
        let secs = self.exec_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.rows_out as f64 / secs
        }
    }
}

impl std::fmt::Display for CursorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rows_out={}, calls={}, time={:?}{}",
            self.rows_out,
            self.has_next_calls,
            self.exec_time,
            if self.failed { ", failed" } else { "" }
        )
    }
}

/// Sink collecting metrics keyed by cursor label.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MetricsSink {
    metrics: Arc<RwLock<BTreeMap<String, CursorMetrics>>>,
}

impl MetricsSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the metrics of `label`.
    pub fn record(&self, label: &str, metrics: CursorMetrics) {
        self.metrics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(label.to_string(), metrics);
    }

    /// Update the metrics of `label` in place.
    pub fn update<F>(&self, label: &str, f: F)
    where
        F: FnOnce(&mut CursorMetrics),
    {
        let mut guard = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        f(guard.entry(label.to_string()).or_default());
    }

    pub fn get(&self, label: &str) -> Option<CursorMetrics> {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(label)
            .cloned()
    }

    pub fn total_rows_out(&self) -> u64 {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|m| m.rows_out)
            .sum()
    }

    pub fn clear(&self) {
        self.metrics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// One line per label, sorted by label.
    pub fn format_analyze(&self) -> String {
        let metrics = self.metrics.read().unwrap_or_else(PoisonError::into_inner);
        let mut output = String::new();
        for (label, m) in metrics.iter() {
            let _ = writeln!(output, "{label}: {m}");
        }
        if output.is_empty() {
            output.push_str("No metrics collected.\n");
        }
        output
    }
}

/// Wall-clock timer for a drain.
#[derive(Debug)]
pub struct ExecutionTimer {
    start: Instant,
}

impl ExecutionTimer {
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[must_use]
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for ExecutionTimer {
    fn default() -> Self {
        Self::start()
    }
}
