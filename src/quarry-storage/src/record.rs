//! Row access over page frames.

use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{Float64Type, Int32Type, Int64Type, TimestampMicrosecondType};

use crate::frame::PageFrame;
use crate::symbol::SymbolTables;

/// Stable address of a row: partition plus partition-local row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId {
    /// Partition index.
    pub partition: usize,
    /// Partition-local row index.
    pub row: u64,
}

impl RowId {
    /// Create a row id.
    pub const fn new(partition: usize, row: u64) -> Self {
        Self { partition, row }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.partition, self.row)
    }
}

/// Read access to the current row of a cursor.
///
/// Getters return `None` for nulls, for out-of-range columns and for type
/// mismatches.
pub trait Record {
    /// Boolean column value.
    fn get_bool(&self, column: usize) -> Option<bool>;

    /// 32-bit integer value; for symbol columns this is the symbol key.
    fn get_int(&self, column: usize) -> Option<i32>;

    /// 64-bit integer value.
    fn get_long(&self, column: usize) -> Option<i64>;

    /// 64-bit float value.
    fn get_double(&self, column: usize) -> Option<f64>;

    /// Timestamp in microseconds.
    fn get_timestamp(&self, column: usize) -> Option<i64>;

    /// Symbol text, resolved through the column's symbol table.
    fn get_sym(&self, column: usize) -> Option<&str>;

    /// Address of the current row.
    fn row_id(&self) -> RowId;
}

/// Row cursor over one page frame, positioned by frame-local row index.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    frame: Option<PageFrame>,
    row: usize,
    symbols: Arc<SymbolTables>,
}

impl FrameRecord {
    /// Create an unpositioned record resolving symbols through `symbols`.
    pub fn new(symbols: Arc<SymbolTables>) -> Self {
        Self {
            frame: None,
            row: 0,
            symbols,
        }
    }

    /// Switch to `frame`, positioned at its first row.
    pub fn of(&mut self, frame: &PageFrame) {
        self.frame = Some(frame.clone());
        self.row = 0;
    }

    /// Position at frame-local `row`.
    pub fn set_row_index(&mut self, row: usize) {
        self.row = row;
    }

    /// Frame-local row index.
    pub fn row_index(&self) -> usize {
        self.row
    }

    /// Current frame, if any.
    pub fn frame(&self) -> Option<&PageFrame> {
        self.frame.as_ref()
    }

    /// Drop the frame reference.
    pub fn clear(&mut self) {
        self.frame = None;
        self.row = 0;
    }

    fn column(&self, column: usize) -> Option<&dyn Array> {
        let frame = self.frame.as_ref()?;
        let array = frame.batch().columns().get(column)?;
        if self.row >= array.len() || array.is_null(self.row) {
            return None;
        }
        Some(array.as_ref())
    }
}

impl Record for FrameRecord {
    fn get_bool(&self, column: usize) -> Option<bool> {
        self.column(column)?
            .as_boolean_opt()
            .map(|a| a.value(self.row))
    }

    fn get_int(&self, column: usize) -> Option<i32> {
        self.column(column)?
            .as_primitive_opt::<Int32Type>()
            .map(|a| a.value(self.row))
    }

    fn get_long(&self, column: usize) -> Option<i64> {
        self.column(column)?
            .as_primitive_opt::<Int64Type>()
            .map(|a| a.value(self.row))
    }

    fn get_double(&self, column: usize) -> Option<f64> {
        self.column(column)?
            .as_primitive_opt::<Float64Type>()
            .map(|a| a.value(self.row))
    }

    fn get_timestamp(&self, column: usize) -> Option<i64> {
        self.column(column)?
            .as_primitive_opt::<TimestampMicrosecondType>()
            .map(|a| a.value(self.row))
    }

    fn get_sym(&self, column: usize) -> Option<&str> {
        let key = self.get_int(column)?;
        self.symbols.get(column)?.value_of(key)
    }

    fn row_id(&self) -> RowId {
        match &self.frame {
            Some(frame) => RowId::new(
                frame.partition_index(),
                frame.partition_lo() + self.row as u64,
            ),
            None => RowId::new(0, 0),
        }
    }
}
