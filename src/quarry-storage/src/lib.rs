//! Storage layer contracts for Quarry.
//!
//! The execution core never reads column files directly. It pulls
//! immutable [`PageFrame`]s from a [`PageFrameCursor`] and reads individual
//! rows through the [`Record`] trait. This crate defines those contracts and
//! ships an Arrow-backed in-memory implementation used by tests and
//! embedders:
//!
//! - [`PageFrame`]: rows `[partition_lo, partition_hi)` of one partition
//! - [`PageFrameCursor`]: partition-ordered frame source
//! - [`FrameRecord`]: a row cursor positioned by frame-local row index
//! - [`SymbolTable`]: key ↔ text dictionary of a symbol column
//! - [`MemoryTable`]: partitioned table held as Arrow `RecordBatch`es
//!
//! # Example
//!
//! ```rust,ignore
//! use quarry_storage::{ColumnType, MemoryTable, ScanDirection, Value};
//!
//! let table = MemoryTable::builder()
//!     .column("sym", ColumnType::Symbol)
//!     .column("price", ColumnType::Double)
//!     .partition(vec![vec![Value::symbol("AAPL"), Value::Double(1.5)]])?
//!     .build()?;
//!
//! let mut frames = table.cursor(ScanDirection::Backward);
//! while let Some(frame) = frames.next()? {
//!     println!("{} rows", frame.row_count());
//! }
//! ```

mod frame;
mod record;
mod symbol;
mod types;

pub mod memory;

pub use frame::{PageFrame, PageFrameCursor, ScanDirection};
pub use memory::{MemoryPageFrameCursor, MemoryTable, MemoryTableBuilder};
pub use record::{FrameRecord, Record, RowId};
pub use symbol::{SymbolTable, SymbolTableSource, SymbolTables};
pub use types::{ColumnType, Value};
