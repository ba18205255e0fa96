//! Shared pieces of the latest-by scans.

use std::fmt;
use std::sync::Arc;

use common_error::{QuarryError, QuarryResult};
use quarry_storage::{FrameRecord, PageFrameCursor, Record, SymbolTables};

use crate::cursor::CursorState;
use crate::executor::{CircuitBreaker, ExecutionContext, NoopCircuitBreaker};

// ============================================================================
// Scan state
// ============================================================================

/// Find-once bookkeeping of a latest-by cursor.
///
/// The first `has_next` after binding runs the search; later calls only
/// hand out the cached result. Rewinding replays the cached row without
/// searching again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestByScanState {
    find_pending: bool,
    record_found: bool,
    has_next: bool,
}

impl LatestByScanState {
    pub fn new() -> Self {
        Self {
            find_pending: true,
            record_found: false,
            has_next: false,
        }
    }

    /// Whether the search still has to run.
    pub fn needs_find(&self) -> bool {
        self.find_pending
    }

    /// Record the outcome of the search.
    pub fn complete_find(&mut self, found: bool) {
        self.find_pending = false;
        self.record_found = found;
        self.has_next = found;
    }

    /// Hand out the cached row at most once.
    pub fn take_next(&mut self) -> bool {
        std::mem::take(&mut self.has_next)
    }

    /// Make the cached row available again.
    pub fn rewind(&mut self) {
        self.has_next = self.record_found;
    }

    /// Forget everything; the next `has_next` searches.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn record_found(&self) -> bool {
        self.record_found
    }

    /// Rows found by the search: zero or one.
    pub fn pre_computed_state_size(&self) -> u64 {
        u64::from(self.record_found)
    }
}

impl Default for LatestByScanState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Symbol column and key
// ============================================================================

/// The symbol column searched by a latest-by scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolColumn {
    pub index: usize,
    pub name: String,
}

impl SymbolColumn {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

/// The symbol value searched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKey {
    /// Key already known at compile time.
    Resolved(i32),
    /// Text resolved against the frame cursor's symbol table when the
    /// cursor is bound.
    Deferred(String),
}

impl SymbolKey {
    fn resolve(&self, column: usize, symbols: &SymbolTables) -> Option<i32> {
        match self {
            Self::Resolved(key) => Some(*key),
            Self::Deferred(text) => symbols.get(column).and_then(|t| t.key_of(text)),
        }
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(key) => write!(f, "{key}"),
            Self::Deferred(text) => write!(f, "'{text}'"),
        }
    }
}

// ============================================================================
// Backward search
// ============================================================================

/// Walk frames in the order given, rows from high to low, and stop at the
/// first row `accept` takes. `record` is left on that row. Returns whether
/// a row was found and how many frames were visited.
pub(crate) fn find_latest(
    frames: &mut dyn PageFrameCursor,
    record: &mut FrameRecord,
    circuit_breaker: &dyn CircuitBreaker,
    mut accept: impl FnMut(&FrameRecord) -> bool,
) -> QuarryResult<(bool, usize)> {
    let mut visited = 0;
    loop {
        circuit_breaker.check()?;
        let Some(frame) = frames.next()? else {
            return Ok((false, visited));
        };
        visited += 1;
        record.of(&frame);
        for row in (0..frame.row_count()).rev() {
            record.set_row_index(row);
            if accept(&*record) {
                return Ok((true, visited));
            }
        }
    }
}

// ============================================================================
// Shared cursor core
// ============================================================================

/// Frame source, row and search state shared by both latest-by cursors.
pub(crate) struct LatestByCore {
    pub(crate) column: SymbolColumn,
    pub(crate) key: SymbolKey,
    resolved: Option<i32>,
    frames: Option<Box<dyn PageFrameCursor>>,
    record: FrameRecord,
    circuit_breaker: Arc<dyn CircuitBreaker>,
    scan: LatestByScanState,
    state: CursorState,
}

impl LatestByCore {
    pub(crate) fn new(column: SymbolColumn, key: SymbolKey) -> Self {
        Self {
            column,
            key,
            resolved: None,
            frames: None,
            record: FrameRecord::new(Arc::new(SymbolTables::default())),
            circuit_breaker: Arc::new(NoopCircuitBreaker),
            scan: LatestByScanState::new(),
            state: CursorState::Fresh,
        }
    }

    pub(crate) fn of(&mut self, frames: Box<dyn PageFrameCursor>, ctx: &ExecutionContext) {
        let symbols = frames.symbol_tables();
        self.resolved = self.key.resolve(self.column.index, &symbols);
        self.record = FrameRecord::new(symbols);
        self.circuit_breaker = ctx.circuit_breaker();
        self.frames = Some(frames);
        self.scan.reset();
        self.state = CursorState::Fresh;
    }

    /// Run the search if needed, then hand out the cached row once.
    /// `pre` is evaluated before the key comparison.
    pub(crate) fn has_next(
        &mut self,
        mut pre: impl FnMut(&FrameRecord) -> bool,
    ) -> QuarryResult<bool> {
        if self.state == CursorState::Closed {
            return Ok(false);
        }
        if self.scan.needs_find() {
            let frames = self
                .frames
                .as_mut()
                .ok_or_else(|| QuarryError::execution("cursor not bound to a frame source"))?;
            match self.resolved {
                None => {
                    log::debug!(
                        "latest by {}={}: symbol not in table, nothing to scan",
                        self.column.name,
                        self.key
                    );
                    self.scan.complete_find(false);
                }
                Some(key) => {
                    let column = self.column.index;
                    let (found, visited) = find_latest(
                        &mut **frames,
                        &mut self.record,
                        &*self.circuit_breaker,
                        |r| pre(r) && r.get_int(column) == Some(key),
                    )?;
                    log::debug!(
                        "latest by {}={}: found={found}, frames visited={visited}",
                        self.column.name,
                        self.key
                    );
                    self.scan.complete_find(found);
                }
            }
        } else {
            // the cached row is served without a scan, so poll here
            self.circuit_breaker.check()?;
        }
        let next = self.scan.take_next();
        self.state = if next {
            CursorState::Positioned
        } else {
            CursorState::Exhausted
        };
        Ok(next)
    }

    pub(crate) fn record(&self) -> &dyn Record {
        &self.record
    }

    pub(crate) fn to_top(&mut self) {
        if self.state == CursorState::Closed {
            return;
        }
        if self.scan.needs_find() {
            if let Some(frames) = self.frames.as_mut() {
                frames.to_top();
            }
        }
        self.scan.rewind();
        self.state = CursorState::Fresh;
    }

    pub(crate) fn close(&mut self) {
        if let Some(mut frames) = self.frames.take() {
            frames.close();
        }
        self.record.clear();
        self.state = CursorState::Closed;
    }

    pub(crate) fn state(&self) -> CursorState {
        self.state
    }

    pub(crate) fn pre_computed_state_size(&self) -> u64 {
        self.scan.pre_computed_state_size()
    }

    pub(crate) fn symbol_filter(&self) -> String {
        format!("{}={}", self.column.name, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_storage::SymbolTable;

    #[test]
    fn test_scan_state_find_once() {
        let mut state = LatestByScanState::new();
        assert!(state.needs_find());
        state.complete_find(true);
        assert!(!state.needs_find());
        assert_eq!(state.pre_computed_state_size(), 1);
        assert!(state.take_next());
        assert!(!state.take_next());
        assert!(!state.take_next());

        state.rewind();
        assert!(state.take_next());
        assert!(!state.take_next());
    }

    #[test]
    fn test_scan_state_not_found() {
        let mut state = LatestByScanState::new();
        state.complete_find(false);
        assert!(!state.take_next());
        state.rewind();
        assert!(!state.take_next());
        assert!(!state.record_found());

        state.reset();
        assert!(state.needs_find());
    }

    #[test]
    fn test_symbol_key_resolution() {
        let symbols = SymbolTables::new(vec![Some(Arc::new(SymbolTable::from_values([
            "a", "b",
        ])))]);
        assert_eq!(SymbolKey::Resolved(7).resolve(0, &symbols), Some(7));
        assert_eq!(SymbolKey::Deferred("b".into()).resolve(0, &symbols), Some(1));
        assert_eq!(SymbolKey::Deferred("z".into()).resolve(0, &symbols), None);
        assert_eq!(SymbolKey::Deferred("a".into()).resolve(3, &symbols), None);
        assert_eq!(SymbolKey::Deferred("a".into()).to_string(), "'a'");
    }
}
