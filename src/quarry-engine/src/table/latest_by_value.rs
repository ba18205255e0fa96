//! Latest row for one symbol value.
//!
//! Both cursors walk partitions newest first and rows from `partition_hi - 1`
//! down to `partition_lo`, stopping at the first matching row. They produce
//! at most one row per binding. Frames must come from a backward frame
//! cursor.

use common_display::{Describe, PlanSink};
use common_error::QuarryResult;
use quarry_storage::{PageFrameCursor, Record};

use crate::cursor::{CursorSize, CursorState, PageFrameRecordCursor, RecordCursor};
use crate::executor::ExecutionContext;
use crate::expr::Function;
use crate::table::latest_by::{LatestByCore, SymbolColumn, SymbolKey};

// ============================================================================
// Unfiltered
// ============================================================================

/// Most recent row whose symbol column equals the key.
pub struct LatestByValueRecordCursor {
    core: LatestByCore,
}

impl LatestByValueRecordCursor {
    pub fn new(column: SymbolColumn, key: SymbolKey) -> Self {
        Self {
            core: LatestByCore::new(column, key),
        }
    }
}

impl RecordCursor for LatestByValueRecordCursor {
    fn has_next(&mut self) -> QuarryResult<bool> {
        self.core.has_next(|_| true)
    }

    fn record(&self) -> &dyn Record {
        self.core.record()
    }

    fn size(&self) -> CursorSize {
        CursorSize::Unknown
    }

    fn to_top(&mut self) {
        self.core.to_top();
    }

    fn close(&mut self) {
        self.core.close();
    }

    fn state(&self) -> CursorState {
        self.core.state()
    }

    fn pre_computed_state_size(&self) -> u64 {
        self.core.pre_computed_state_size()
    }
}

impl PageFrameRecordCursor for LatestByValueRecordCursor {
    fn of(
        &mut self,
        frames: Box<dyn PageFrameCursor>,
        ctx: &ExecutionContext,
    ) -> QuarryResult<()> {
        self.core.of(frames, ctx);
        Ok(())
    }
}

impl Describe for LatestByValueRecordCursor {
    fn describe(&self, sink: &mut PlanSink) {
        sink.type_("Row backward scan")
            .attr("symbolFilter", self.core.symbol_filter());
    }
}

// ============================================================================
// Filtered
// ============================================================================

/// Most recent row passing the filter whose symbol column equals the key.
///
/// The filter is evaluated first; the key is compared only on rows that
/// pass it.
pub struct LatestByValueFilteredRecordCursor {
    core: LatestByCore,
    filter: Box<dyn Function>,
}

impl LatestByValueFilteredRecordCursor {
    pub fn new(column: SymbolColumn, key: SymbolKey, filter: Box<dyn Function>) -> Self {
        Self {
            core: LatestByCore::new(column, key),
            filter,
        }
    }
}

impl RecordCursor for LatestByValueFilteredRecordCursor {
    fn has_next(&mut self) -> QuarryResult<bool> {
        let filter = &self.filter;
        self.core.has_next(|record| filter.get_bool(record))
    }

    fn record(&self) -> &dyn Record {
        self.core.record()
    }

    fn size(&self) -> CursorSize {
        CursorSize::Unknown
    }

    fn to_top(&mut self) {
        self.core.to_top();
        self.filter.to_top();
    }

    fn close(&mut self) {
        self.core.close();
    }

    fn state(&self) -> CursorState {
        self.core.state()
    }

    fn pre_computed_state_size(&self) -> u64 {
        self.core.pre_computed_state_size()
    }
}

impl PageFrameRecordCursor for LatestByValueFilteredRecordCursor {
    fn of(
        &mut self,
        frames: Box<dyn PageFrameCursor>,
        ctx: &ExecutionContext,
    ) -> QuarryResult<()> {
        self.filter.init(&*frames.symbol_tables(), ctx)?;
        self.core.of(frames, ctx);
        Ok(())
    }
}

impl Describe for LatestByValueFilteredRecordCursor {
    fn describe(&self, sink: &mut PlanSink) {
        sink.type_("Row backward scan")
            .attr("symbolFilter", self.core.symbol_filter())
            .attr("filter", &self.filter);
    }
}
