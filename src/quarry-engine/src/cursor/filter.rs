//! Row filter over any frame cursor.

use std::sync::Arc;

use common_display::{Describe, PlanSink};
use common_error::QuarryResult;
use quarry_storage::{PageFrameCursor, Record};

use crate::cursor::{CursorSize, CursorState, PageFrameRecordCursor, RecordCursor};
use crate::executor::{CircuitBreaker, ExecutionContext, NoopCircuitBreaker};
use crate::expr::Function;

/// Passes through the rows of `base` for which the filter is true.
pub struct FilteredRecordCursor<C> {
    base: C,
    filter: Box<dyn Function>,
    circuit_breaker: Arc<dyn CircuitBreaker>,
    state: CursorState,
}

impl<C: PageFrameRecordCursor> FilteredRecordCursor<C> {
    /// Filter the rows of `base`.
    pub fn new(base: C, filter: Box<dyn Function>) -> Self {
        Self {
            base,
            filter,
            circuit_breaker: Arc::new(NoopCircuitBreaker),
            state: CursorState::Fresh,
        }
    }

    /// The filter predicate.
    pub fn filter(&self) -> &dyn Function {
        self.filter.as_ref()
    }
}

impl<C: PageFrameRecordCursor> RecordCursor for FilteredRecordCursor<C> {
    fn has_next(&mut self) -> QuarryResult<bool> {
        if matches!(self.state, CursorState::Closed | CursorState::Exhausted) {
            return Ok(false);
        }
        loop {
            if !self.base.has_next()? {
                self.state = CursorState::Exhausted;
                return Ok(false);
            }
            self.circuit_breaker.check()?;
            if self.filter.get_bool(self.base.record()) {
                self.state = CursorState::Positioned;
                return Ok(true);
            }
        }
    }

    fn record(&self) -> &dyn Record {
        self.base.record()
    }

    fn size(&self) -> CursorSize {
        CursorSize::Unknown
    }

    fn to_top(&mut self) {
        if self.state == CursorState::Closed {
            return;
        }
        self.base.to_top();
        self.filter.to_top();
        self.state = CursorState::Fresh;
    }

    fn close(&mut self) {
        self.base.close();
        self.state = CursorState::Closed;
    }

    fn state(&self) -> CursorState {
        self.state
    }
}

impl<C: PageFrameRecordCursor> PageFrameRecordCursor for FilteredRecordCursor<C> {
    fn of(
        &mut self,
        frames: Box<dyn PageFrameCursor>,
        ctx: &ExecutionContext,
    ) -> QuarryResult<()> {
        self.filter.init(&*frames.symbol_tables(), ctx)?;
        self.base.of(frames, ctx)?;
        self.circuit_breaker = ctx.circuit_breaker();
        self.state = CursorState::Fresh;
        Ok(())
    }
}

impl<C: PageFrameRecordCursor> Describe for FilteredRecordCursor<C> {
    fn describe(&self, sink: &mut PlanSink) {
        sink.type_("Filter")
            .attr("filter", &self.filter)
            .describe_child(&self.base);
    }
}
