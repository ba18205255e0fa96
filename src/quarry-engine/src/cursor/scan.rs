//! Forward full scan.

use std::sync::Arc;

use common_display::{Describe, PlanSink};
use common_error::{QuarryError, QuarryResult};
use quarry_storage::{FrameRecord, PageFrameCursor, Record, SymbolTables};

use crate::cursor::{CursorSize, CursorState, PageFrameRecordCursor, RecordCursor};
use crate::executor::{CircuitBreaker, ExecutionContext, NoopCircuitBreaker};

/// Returns every row of every frame, in frame order.
///
/// The breaker is checked once per frame.
pub struct FullScanRecordCursor {
    frames: Option<Box<dyn PageFrameCursor>>,
    record: FrameRecord,
    circuit_breaker: Arc<dyn CircuitBreaker>,
    next_row: usize,
    frame_rows: usize,
    state: CursorState,
}

impl FullScanRecordCursor {
    /// Create an unbound cursor.
    pub fn new() -> Self {
        Self {
            frames: None,
            record: FrameRecord::new(Arc::new(SymbolTables::default())),
            circuit_breaker: Arc::new(NoopCircuitBreaker),
            next_row: 0,
            frame_rows: 0,
            state: CursorState::Fresh,
        }
    }
}

impl Default for FullScanRecordCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordCursor for FullScanRecordCursor {
    fn has_next(&mut self) -> QuarryResult<bool> {
        if matches!(self.state, CursorState::Closed | CursorState::Exhausted) {
            return Ok(false);
        }
        let frames = self
            .frames
            .as_mut()
            .ok_or_else(|| QuarryError::execution("cursor not bound to a frame source"))?;
        loop {
            if self.next_row < self.frame_rows {
                self.record.set_row_index(self.next_row);
                self.next_row += 1;
                self.state = CursorState::Positioned;
                return Ok(true);
            }
            self.circuit_breaker.check()?;
            match frames.next()? {
                Some(frame) => {
                    self.record.of(&frame);
                    self.frame_rows = frame.row_count();
                    self.next_row = 0;
                }
                None => {
                    self.state = CursorState::Exhausted;
                    return Ok(false);
                }
            }
        }
    }

    fn record(&self) -> &dyn Record {
        &self.record
    }

    fn size(&self) -> CursorSize {
        self.frames
            .as_ref()
            .map_or(CursorSize::Unknown, |f| CursorSize::from(f.size()))
    }

    fn to_top(&mut self) {
        if self.state == CursorState::Closed {
            return;
        }
        if let Some(frames) = self.frames.as_mut() {
            frames.to_top();
        }
        self.record.clear();
        self.next_row = 0;
        self.frame_rows = 0;
        self.state = CursorState::Fresh;
    }

    fn close(&mut self) {
        if let Some(mut frames) = self.frames.take() {
            frames.close();
        }
        self.record.clear();
        self.state = CursorState::Closed;
    }

    fn state(&self) -> CursorState {
        self.state
    }
}

impl PageFrameRecordCursor for FullScanRecordCursor {
    fn of(
        &mut self,
        frames: Box<dyn PageFrameCursor>,
        ctx: &ExecutionContext,
    ) -> QuarryResult<()> {
        self.record = FrameRecord::new(frames.symbol_tables());
        self.circuit_breaker = ctx.circuit_breaker();
        self.frames = Some(frames);
        self.next_row = 0;
        self.frame_rows = 0;
        self.state = CursorState::Fresh;
        Ok(())
    }
}

impl Describe for FullScanRecordCursor {
    fn describe(&self, sink: &mut PlanSink) {
        sink.type_("Frame forward scan");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{EngineResources, QueryBinding, SecurityContext};
    use common_config::EngineConfig;
    use quarry_storage::{ColumnType, MemoryTable, ScanDirection, Value};

    fn table() -> MemoryTable {
        let rows = |range: std::ops::Range<i64>| {
            range.map(|v| vec![Value::Long(v)]).collect::<Vec<_>>()
        };
        MemoryTable::builder()
            .column("v", ColumnType::Long)
            .max_frame_rows(2)
            .partition(rows(0..3))
            .unwrap()
            .partition(rows(3..5))
            .unwrap()
            .build()
            .unwrap()
    }

    fn ctx() -> ExecutionContext {
        let mut ctx = EngineResources::new(EngineConfig::default())
            .unwrap()
            .new_context();
        ctx.bind(QueryBinding::new(SecurityContext::read_only("test")));
        ctx
    }

    fn drain(cursor: &mut FullScanRecordCursor) -> Vec<i64> {
        let mut out = Vec::new();
        while cursor.has_next().unwrap() {
            out.push(cursor.record().get_long(0).unwrap());
        }
        out
    }

    #[test]
    fn test_scan_all_rows() {
        let mut cursor = FullScanRecordCursor::new();
        cursor
            .of(Box::new(table().cursor(ScanDirection::Forward)), &ctx())
            .unwrap();
        assert_eq!(cursor.size(), CursorSize::Exact(5));
        assert_eq!(drain(&mut cursor), vec![0, 1, 2, 3, 4]);
        assert_eq!(cursor.state(), CursorState::Exhausted);
        assert!(!cursor.has_next().unwrap());
    }

    #[test]
    fn test_to_top_replays() {
        let mut cursor = FullScanRecordCursor::new();
        cursor
            .of(Box::new(table().cursor(ScanDirection::Forward)), &ctx())
            .unwrap();
        let first = drain(&mut cursor);
        cursor.to_top();
        assert_eq!(cursor.state(), CursorState::Fresh);
        assert_eq!(drain(&mut cursor), first);
    }

    #[test]
    fn test_unbound_cursor_errors() {
        let mut cursor = FullScanRecordCursor::new();
        assert!(matches!(
            cursor.has_next(),
            Err(QuarryError::ExecutionError(_))
        ));
        assert_eq!(cursor.size(), CursorSize::Unknown);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut cursor = FullScanRecordCursor::new();
        cursor
            .of(Box::new(table().cursor(ScanDirection::Forward)), &ctx())
            .unwrap();
        assert!(cursor.has_next().unwrap());
        cursor.close();
        cursor.close();
        assert_eq!(cursor.state(), CursorState::Closed);
        assert!(!cursor.has_next().unwrap());
    }
}
