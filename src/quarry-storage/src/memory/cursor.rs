//! Frame cursor over an in-memory table.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use common_error::{QuarryError, QuarryResult};

use crate::frame::{PageFrame, PageFrameCursor, ScanDirection};
use crate::symbol::{SymbolTable, SymbolTableSource, SymbolTables};

/// Frame boundary inside a partition.
#[derive(Debug, Clone, Copy)]
struct FrameSpan {
    partition: usize,
    lo: usize,
    len: usize,
}

/// [`PageFrameCursor`] over the partitions of a
/// [`MemoryTable`](super::MemoryTable).
#[derive(Debug)]
pub struct MemoryPageFrameCursor {
    partitions: Arc<Vec<RecordBatch>>,
    symbols: Arc<SymbolTables>,
    spans: Vec<FrameSpan>,
    position: usize,
    fail_on_frame: Option<usize>,
    closed: bool,
}

impl MemoryPageFrameCursor {
    pub(super) fn new(
        partitions: Arc<Vec<RecordBatch>>,
        symbols: Arc<SymbolTables>,
        direction: ScanDirection,
        max_frame_rows: usize,
        fail_on_frame: Option<usize>,
    ) -> Self {
        let spans = Self::plan_spans(&partitions, direction, max_frame_rows);
        Self {
            partitions,
            symbols,
            spans,
            position: 0,
            fail_on_frame,
            closed: false,
        }
    }

    fn plan_spans(
        partitions: &[RecordBatch],
        direction: ScanDirection,
        max_frame_rows: usize,
    ) -> Vec<FrameSpan> {
        let mut spans = Vec::new();
        for (partition, batch) in partitions.iter().enumerate() {
            let rows = batch.num_rows();
            let mut lo = 0;
            while lo < rows {
                let len = max_frame_rows.min(rows - lo);
                spans.push(FrameSpan { partition, lo, len });
                lo += len;
            }
        }
        if direction == ScanDirection::Backward {
            spans.reverse();
        }
        spans
    }

    /// Number of frames the cursor will produce.
    pub fn frame_count(&self) -> usize {
        self.spans.len()
    }
}

impl SymbolTableSource for MemoryPageFrameCursor {
    fn symbol_table(&self, column: usize) -> Option<Arc<SymbolTable>> {
        self.symbols.get(column).cloned()
    }
}

impl PageFrameCursor for MemoryPageFrameCursor {
    fn next(&mut self) -> QuarryResult<Option<PageFrame>> {
        if self.closed {
            return Err(QuarryError::storage("frame cursor is closed"));
        }
        let Some(span) = self.spans.get(self.position).copied() else {
            return Ok(None);
        };
        if self.fail_on_frame == Some(self.position) {
            log::warn!(
                "injected read failure at frame {} of partition {}",
                self.position,
                span.partition
            );
            return Err(QuarryError::storage(format!(
                "could not read partition {} rows [{}, {})",
                span.partition,
                span.lo,
                span.lo + span.len
            )));
        }
        self.position += 1;

        let batch = self.partitions[span.partition].slice(span.lo, span.len);
        Ok(Some(PageFrame::new(span.partition, span.lo as u64, batch)))
    }

    fn to_top(&mut self) {
        self.position = 0;
    }

    fn size(&self) -> Option<u64> {
        Some(self.spans.iter().map(|s| s.len as u64).sum())
    }

    fn symbol_tables(&self) -> Arc<SymbolTables> {
        Arc::clone(&self.symbols)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTable;
    use crate::types::{ColumnType, Value};

    fn table() -> MemoryTable {
        let longs = |range: std::ops::Range<i64>| {
            range.map(|v| vec![Value::Long(v)]).collect::<Vec<_>>()
        };
        MemoryTable::builder()
            .column("v", ColumnType::Long)
            .max_frame_rows(2)
            .partition(longs(0..3))
            .unwrap()
            .partition(longs(3..4))
            .unwrap()
            .build()
            .unwrap()
    }

    fn frames(cursor: &mut MemoryPageFrameCursor) -> Vec<(usize, u64, u64)> {
        let mut out = Vec::new();
        while let Some(frame) = cursor.next().unwrap() {
            out.push((
                frame.partition_index(),
                frame.partition_lo(),
                frame.partition_hi(),
            ));
        }
        out
    }

    #[test]
    fn test_forward_frames() {
        let mut cursor = table().cursor(ScanDirection::Forward);
        assert_eq!(cursor.frame_count(), 3);
        assert_eq!(cursor.size(), Some(4));
        assert_eq!(frames(&mut cursor), vec![(0, 0, 2), (0, 2, 3), (1, 0, 1)]);
    }

    #[test]
    fn test_backward_frames_newest_first() {
        let mut cursor = table().cursor(ScanDirection::Backward);
        assert_eq!(frames(&mut cursor), vec![(1, 0, 1), (0, 2, 3), (0, 0, 2)]);
    }

    #[test]
    fn test_capped_cursor_splits_further() {
        let mut cursor = table().cursor_capped(ScanDirection::Forward, 1);
        assert_eq!(cursor.frame_count(), 4);
        assert_eq!(
            frames(&mut cursor),
            vec![(0, 0, 1), (0, 1, 2), (0, 2, 3), (1, 0, 1)]
        );

        // a looser cap keeps the table's own limit
        let cursor = table().cursor_capped(ScanDirection::Forward, 100);
        assert_eq!(cursor.frame_count(), 3);

        let cursor = table().cursor_capped(ScanDirection::Forward, 0);
        assert_eq!(cursor.frame_count(), 4);
    }

    #[test]
    fn test_to_top_rewinds() {
        let mut cursor = table().cursor(ScanDirection::Forward);
        let first = frames(&mut cursor);
        cursor.to_top();
        assert_eq!(frames(&mut cursor), first);
    }

    #[test]
    fn test_injected_failure() {
        let mut cursor = table().fail_on_frame(1).cursor(ScanDirection::Forward);
        assert!(cursor.next().unwrap().is_some());
        assert!(matches!(cursor.next(), Err(QuarryError::StorageError(_))));
    }

    #[test]
    fn test_closed_cursor_errors() {
        let mut cursor = table().cursor(ScanDirection::Forward);
        cursor.close();
        cursor.close();
        assert!(cursor.next().is_err());
    }
}
