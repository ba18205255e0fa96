//! Cursor factory for latest-by-value queries.

use std::sync::Arc;

use common_display::{Describe, PlanSink};
use common_error::QuarryResult;
use quarry_storage::{FrameRecord, PageFrameCursor};

use crate::cursor::{PageFrameRecordCursor, RecordCursor};
use crate::executor::ExecutionContext;
use crate::expr::Function;
use crate::table::latest_by::{SymbolColumn, SymbolKey};
use crate::table::latest_by_value::{LatestByValueFilteredRecordCursor, LatestByValueRecordCursor};

enum LatestByCursor {
    Plain(LatestByValueRecordCursor),
    Filtered(LatestByValueFilteredRecordCursor),
}

/// Owns one latest-by cursor, picked by whether a filter is present, and
/// rebinds it for every execution.
pub struct LatestByValueCursorFactory {
    cursor: LatestByCursor,
}

impl LatestByValueCursorFactory {
    /// Create a factory. A constant-true filter is dropped.
    pub fn new(column: SymbolColumn, key: SymbolKey, filter: Option<Box<dyn Function>>) -> Self {
        let cursor = match filter {
            Some(filter) if !is_always_true(&*filter) => LatestByCursor::Filtered(
                LatestByValueFilteredRecordCursor::new(column, key, filter),
            ),
            _ => LatestByCursor::Plain(LatestByValueRecordCursor::new(column, key)),
        };
        Self { cursor }
    }

    /// Whether the owned cursor applies a filter.
    pub fn is_filtered(&self) -> bool {
        matches!(self.cursor, LatestByCursor::Filtered(_))
    }

    /// Bind the cursor to `frames`, which must scan backward, and return it.
    pub fn get_cursor(
        &mut self,
        frames: Box<dyn PageFrameCursor>,
        ctx: &ExecutionContext,
    ) -> QuarryResult<&mut dyn RecordCursor> {
        match &mut self.cursor {
            LatestByCursor::Plain(cursor) => {
                cursor.of(frames, ctx)?;
                Ok(cursor)
            }
            LatestByCursor::Filtered(cursor) => {
                cursor.of(frames, ctx)?;
                Ok(cursor)
            }
        }
    }
}

fn is_always_true(filter: &dyn Function) -> bool {
    if !filter.is_constant() {
        return false;
    }
    let empty = FrameRecord::new(Arc::default());
    filter.get_bool(&empty)
}

impl Describe for LatestByValueCursorFactory {
    fn describe(&self, sink: &mut PlanSink) {
        match &self.cursor {
            LatestByCursor::Plain(cursor) => cursor.describe(sink),
            LatestByCursor::Filtered(cursor) => cursor.describe(sink),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BoolConstant, ColumnCompare, CompareOp};

    fn column() -> SymbolColumn {
        SymbolColumn::new(0, "sym")
    }

    #[test]
    fn test_variant_selection() {
        let plain = LatestByValueCursorFactory::new(column(), SymbolKey::Resolved(0), None);
        assert!(!plain.is_filtered());

        let trivially_true = LatestByValueCursorFactory::new(
            column(),
            SymbolKey::Resolved(0),
            Some(Box::new(BoolConstant(true))),
        );
        assert!(!trivially_true.is_filtered());

        let filtered = LatestByValueCursorFactory::new(
            column(),
            SymbolKey::Resolved(0),
            Some(Box::new(ColumnCompare::long("v", 1, CompareOp::Eq, 1))),
        );
        assert!(filtered.is_filtered());
    }
}
