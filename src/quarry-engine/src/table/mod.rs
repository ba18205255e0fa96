//! Table scan cursors.
//!
//! - [`LatestByValueRecordCursor`]: newest row for one symbol value
//! - [`LatestByValueFilteredRecordCursor`]: same, restricted by a filter
//! - [`LatestByValueCursorFactory`]: picks and rebinds one of the above

mod factory;
mod latest_by;
mod latest_by_value;

pub use factory::LatestByValueCursorFactory;
pub use latest_by::{LatestByScanState, SymbolColumn, SymbolKey};
pub use latest_by_value::{LatestByValueFilteredRecordCursor, LatestByValueRecordCursor};
