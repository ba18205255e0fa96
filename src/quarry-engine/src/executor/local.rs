//! Drains a root cursor into materialized rows.

use common_error::QuarryResult;
use quarry_storage::{ColumnType, Record, Value};

use crate::cursor::RecordCursor;
use crate::executor::context::ExecutionContext;
use crate::executor::result::{QueryResult, ResultRow};
use crate::executor::telemetry::{TelemetryEvent, TelemetryOrigin};
use crate::metrics::{CursorMetrics, ExecutionTimer, MetricsSink};

/// Pulls every row out of a root cursor.
///
/// # Contract
///
/// - The principal must be allowed to read.
/// - Rows are returned only when the cursor is drained without error.
/// - Interruptions are reported to telemetry and returned unchanged.
#[derive(Debug, Clone)]
pub struct CursorDriver {
    metrics: Option<MetricsSink>,
    origin: TelemetryOrigin,
}

impl Default for CursorDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorDriver {
    /// Create a driver collecting metrics.
    pub fn new() -> Self {
        Self {
            metrics: Some(MetricsSink::new()),
            origin: TelemetryOrigin::Internal,
        }
    }

    /// Disable metrics collection.
    pub fn without_metrics(mut self) -> Self {
        self.metrics = None;
        self
    }

    /// Tag telemetry events with `origin`.
    pub fn with_origin(mut self, origin: TelemetryOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Collected metrics, if enabled.
    pub fn metrics(&self) -> Option<&MetricsSink> {
        self.metrics.as_ref()
    }

    /// Drain `cursor`, reading the `projection` columns of every row.
    pub fn drain(
        &self,
        cursor: &mut dyn RecordCursor,
        ctx: &ExecutionContext,
        label: &str,
        projection: &[(usize, ColumnType)],
    ) -> QuarryResult<QueryResult> {
        ctx.security_context().authorize_select()?;

        let timer = ExecutionTimer::start();
        let mut metrics = CursorMetrics::new();
        let outcome = Self::pull(cursor, projection, &mut metrics);
        metrics.add_time(timer.stop());
        metrics.failed = outcome.is_err();

        let label = ctx.redact(label);
        match &outcome {
            Ok(result) => {
                log::debug!("{label}: drained {} rows ({metrics})", result.len());
                ctx.store_telemetry(TelemetryEvent::QueryCompleted, self.origin);
            }
            Err(err) => {
                log::warn!("{label}: drain failed after {} rows: {err}", metrics.rows_out);
                if err.is_interruption() {
                    let event = match err {
                        common_error::QuarryError::QueryTimedOut { .. } => {
                            TelemetryEvent::QueryTimedOut
                        }
                        _ => TelemetryEvent::QueryCancelled,
                    };
                    ctx.store_telemetry(event, self.origin);
                }
            }
        }
        if let Some(sink) = &self.metrics {
            sink.record(&label, metrics);
        }
        outcome
    }

    fn pull(
        cursor: &mut dyn RecordCursor,
        projection: &[(usize, ColumnType)],
        metrics: &mut CursorMetrics,
    ) -> QuarryResult<QueryResult> {
        let capacity = cursor
            .size()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        let mut rows = Vec::with_capacity(capacity);
        loop {
            metrics.add_call();
            if !cursor.has_next()? {
                break;
            }
            metrics.add_row();
            rows.push(read_row(cursor.record(), projection));
        }
        Ok(QueryResult::new(rows))
    }
}

fn read_row(record: &dyn Record, projection: &[(usize, ColumnType)]) -> ResultRow {
    let values = projection
        .iter()
        .map(|&(column, column_type)| read_value(record, column, column_type))
        .collect();
    ResultRow::new(record.row_id(), values)
}

fn read_value(record: &dyn Record, column: usize, column_type: ColumnType) -> Value {
    let value = match column_type {
        ColumnType::Bool => record.get_bool(column).map(Value::Bool),
        ColumnType::Int => record.get_int(column).map(Value::Int),
        ColumnType::Long => record.get_long(column).map(Value::Long),
        ColumnType::Double => record.get_double(column).map(Value::Double),
        ColumnType::Timestamp => record.get_timestamp(column).map(Value::Timestamp),
        ColumnType::Symbol => record.get_sym(column).map(Value::symbol),
    };
    value.unwrap_or(Value::Null)
}
