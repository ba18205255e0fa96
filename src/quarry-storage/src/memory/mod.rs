//! Arrow-backed in-memory partitioned tables.
//!
//! Partitions are kept oldest first. A cursor splits each partition into
//! frames of at most `max_frame_rows` rows and visits them in the requested
//! [`ScanDirection`](crate::ScanDirection).

mod cursor;
mod table;

pub use cursor::MemoryPageFrameCursor;
pub use table::{MemoryTable, MemoryTableBuilder};
