//! Pull-based record cursors.
//!
//! Every scan, join and aggregate operator implements [`RecordCursor`]. A
//! cursor moves through these states:
//!
//! ```text
//!   Fresh ──has_next()=true──▶ Positioned ──has_next()=false──▶ Exhausted
//!     ▲                                                            │
//!     └──────────────────────────── to_top() ──────────────────────┘
//!
//!   close() from any state ──▶ Closed
//! ```
//!
//! Cursors are driven by one thread at a time and borrow frame data from
//! their [`PageFrameCursor`] for as long as they are bound to it.

mod filter;
mod scan;

use std::fmt;

use common_display::Describe;
use common_error::QuarryResult;
use quarry_storage::{PageFrameCursor, Record};

use crate::executor::ExecutionContext;

pub use filter::FilteredRecordCursor;
pub use scan::FullScanRecordCursor;

// ============================================================================
// Size
// ============================================================================

/// Row count of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorSize {
    /// The cursor will produce exactly this many rows.
    Exact(u64),
    /// The count cannot be known without running the cursor.
    Unknown,
}

impl CursorSize {
    /// The exact count, if known.
    pub fn exact(self) -> Option<u64> {
        match self {
            Self::Exact(n) => Some(n),
            Self::Unknown => None,
        }
    }

    /// Legacy size hint: the count, or `-1` when unknown.
    pub fn as_hint(self) -> i64 {
        match self {
            Self::Exact(n) => i64::try_from(n).unwrap_or(i64::MAX),
            Self::Unknown => -1,
        }
    }
}

impl From<Option<u64>> for CursorSize {
    fn from(size: Option<u64>) -> Self {
        size.map_or(Self::Unknown, Self::Exact)
    }
}

impl fmt::Display for CursorSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// Lifecycle state of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorState {
    /// Bound or rewound, no row returned yet.
    #[default]
    Fresh,
    /// The last `has_next` returned `true`.
    Positioned,
    /// The last `has_next` returned `false`.
    Exhausted,
    /// Resources released.
    Closed,
}

// ============================================================================
// Traits
// ============================================================================

/// Pull interface over a stream of rows.
pub trait RecordCursor: Describe + Send {
    /// Advance to the next row.
    ///
    /// Each `true` exposes exactly one new row through
    /// [`record`](Self::record). Once `false` is returned every later call
    /// returns `false` until [`to_top`](Self::to_top). May perform I/O and
    /// fails with an interruption error when the query's breaker trips.
    fn has_next(&mut self) -> QuarryResult<bool>;

    /// The current row. Only meaningful after `has_next` returned `true`.
    fn record(&self) -> &dyn Record;

    /// Row count, when cheap to know.
    fn size(&self) -> CursorSize;

    /// Rewind so the same sequence is produced again.
    fn to_top(&mut self);

    /// Release resources. Idempotent.
    fn close(&mut self);

    /// Lifecycle state.
    fn state(&self) -> CursorState;

    /// Rows already computed before iteration, e.g. a cached match.
    fn pre_computed_state_size(&self) -> u64 {
        0
    }
}

/// A cursor reading rows straight out of page frames.
pub trait PageFrameRecordCursor: RecordCursor {
    /// Bind to `frames` for the query described by `ctx`. Resets the
    /// cursor to [`CursorState::Fresh`].
    fn of(&mut self, frames: Box<dyn PageFrameCursor>, ctx: &ExecutionContext)
    -> QuarryResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_size() {
        assert_eq!(CursorSize::Exact(3).exact(), Some(3));
        assert_eq!(CursorSize::Unknown.exact(), None);
        assert_eq!(CursorSize::Exact(3).as_hint(), 3);
        assert_eq!(CursorSize::Unknown.as_hint(), -1);
        assert_eq!(CursorSize::from(Some(9)), CursorSize::Exact(9));
        assert_eq!(CursorSize::from(None), CursorSize::Unknown);
        assert_eq!(CursorSize::Unknown.to_string(), "unknown");
    }
}
