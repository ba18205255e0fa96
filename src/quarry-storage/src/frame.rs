//! Page frames and the frame cursor contract.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use common_error::QuarryResult;

use crate::symbol::{SymbolTableSource, SymbolTables};

/// Order in which partitions are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanDirection {
    /// Oldest partition first, frames in ascending row order.
    #[default]
    Forward,
    /// Newest partition first, frames in descending row order.
    Backward,
}

/// An immutable batch of column data covering partition-local rows
/// `[partition_lo, partition_hi)`.
///
/// Cloning a frame shares the underlying column buffers.
#[derive(Debug, Clone)]
pub struct PageFrame {
    partition_index: usize,
    partition_lo: u64,
    partition_hi: u64,
    batch: RecordBatch,
}

impl PageFrame {
    /// Create a frame; `batch` holds exactly the rows of the range.
    pub fn new(partition_index: usize, partition_lo: u64, batch: RecordBatch) -> Self {
        let partition_hi = partition_lo + batch.num_rows() as u64;
        Self {
            partition_index,
            partition_lo,
            partition_hi,
            batch,
        }
    }

    /// Index of the partition this frame belongs to.
    pub fn partition_index(&self) -> usize {
        self.partition_index
    }

    /// First partition-local row (inclusive).
    pub fn partition_lo(&self) -> u64 {
        self.partition_lo
    }

    /// Last partition-local row (exclusive).
    pub fn partition_hi(&self) -> u64 {
        self.partition_hi
    }

    /// Number of rows in the frame.
    pub fn row_count(&self) -> usize {
        self.batch.num_rows()
    }

    /// Column data of the frame.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }
}

/// Partition-ordered source of page frames.
///
/// Implementations are driven by one thread at a time. `next` may perform
/// I/O and surfaces storage failures as errors; callers do not retry them.
pub trait PageFrameCursor: SymbolTableSource + Send {
    /// Next frame, or `None` when all partitions have been visited.
    fn next(&mut self) -> QuarryResult<Option<PageFrame>>;

    /// Rewind to the first frame.
    fn to_top(&mut self);

    /// Total row count across all frames, when known up front.
    fn size(&self) -> Option<u64>;

    /// Symbol tables of all columns, shared with row records.
    fn symbol_tables(&self) -> Arc<SymbolTables>;

    /// Release resources. Idempotent.
    fn close(&mut self) {}
}
