//! Query execution core for quarry.
//!
//! This crate provides the per-query execution context and the record
//! cursors that pull rows out of partitioned storage.

#![allow(clippy::missing_const_for_fn)] // Builder patterns often can't be const
#![allow(clippy::return_self_not_must_use)] // Builder patterns don't always need must_use
#![allow(clippy::doc_markdown)] // Documentation backticks are sometimes unnecessary
#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)] // Row indices move between usize, u64 and i64
#![allow(clippy::struct_excessive_bools)] // The execution context carries many flags
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::new_without_default)]
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ PageFrameCursor  │ ──▶ │  RecordCursor    │ ──▶ │   CursorDriver   │
//! │ (quarry-storage) │     │  (scan, filter,  │     │                  │
//! └──────────────────┘     │   latest by)     │     └──────────────────┘
//!                          └──────────────────┘              │
//!                                   │                        ▼
//!                                   ▼                   QueryResult
//!                           ExecutionContext
//!                     (breaker, clock, security)
//! ```
//!
//! # Key Components
//!
//! ## Execution context ([`executor`])
//!
//! - [`EngineResources`]: Configuration, clock, shared random and telemetry
//! - [`ExecutionContext`]: Identity, bind variables, breakers, clock pinning
//! - [`CircuitBreaker`]: [`QueryCircuitBreaker`] checks cancellation and
//!   the time budget, [`AtomicBooleanCircuitBreaker`] checks only the flag
//!
//! ## Cursors ([`cursor`], [`table`])
//!
//! All cursors implement [`RecordCursor`] with a pull-based API:
//!
//! - **Scan**: [`FullScanRecordCursor`] streams every row of every frame
//! - **Filter**: [`FilteredRecordCursor`] applies a [`Function`] per row
//! - **Latest by**: [`LatestByValueRecordCursor`] and
//!   [`LatestByValueFilteredRecordCursor`] return the newest row carrying
//!   one symbol value
//!
//! ## Joins ([`join`])
//!
//! - [`SymbolShortCircuit`]: proves a master row has no slave match
//!
//! # Example
//!
//! ```rust,ignore
//! use quarry_engine::executor::{EngineResources, QueryBinding, SecurityContext};
//! use quarry_engine::table::{LatestByValueCursorFactory, SymbolColumn, SymbolKey};
//! use quarry_storage::ScanDirection;
//!
//! let resources = EngineResources::new(config)?;
//! let mut ctx = resources.new_context();
//! ctx.bind(QueryBinding::new(SecurityContext::read_only("alice")));
//!
//! let mut factory = LatestByValueCursorFactory::new(
//!     SymbolColumn::new(0, "sym"),
//!     SymbolKey::Deferred("AAPL".into()),
//!     None,
//! );
//! let cursor = factory.get_cursor(ctx.page_frame_cursor(&table, ScanDirection::Backward), &ctx)?;
//! let result = CursorDriver::new().drain(cursor, &ctx, "latest", &projection)?;
//! ```
//!
//! [`EngineResources`]: executor::EngineResources
//! [`ExecutionContext`]: executor::ExecutionContext
//! [`CircuitBreaker`]: executor::CircuitBreaker
//! [`QueryCircuitBreaker`]: executor::QueryCircuitBreaker
//! [`AtomicBooleanCircuitBreaker`]: executor::AtomicBooleanCircuitBreaker
//! [`RecordCursor`]: cursor::RecordCursor
//! [`FullScanRecordCursor`]: cursor::FullScanRecordCursor
//! [`FilteredRecordCursor`]: cursor::FilteredRecordCursor
//! [`Function`]: expr::Function
//! [`LatestByValueRecordCursor`]: table::LatestByValueRecordCursor
//! [`LatestByValueFilteredRecordCursor`]: table::LatestByValueFilteredRecordCursor
//! [`SymbolShortCircuit`]: join::SymbolShortCircuit

pub mod cursor;
pub mod executor;
pub mod expr;
pub mod join;
pub mod metrics;
pub mod table;

pub use cursor::{CursorSize, CursorState, PageFrameRecordCursor, RecordCursor};
pub use executor::{
    CancellationHandle, CircuitBreaker, CursorDriver, EngineResources, ExecutionContext,
    QueryBinding, QueryResult, SecurityContext,
};
pub use expr::Function;
pub use metrics::{CursorMetrics, MetricsSink};
pub use table::LatestByValueCursorFactory;
