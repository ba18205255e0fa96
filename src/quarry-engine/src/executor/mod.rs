//! Query execution module.
//!
//! This module provides the per-query runtime of quarry:
//!
//! - [`EngineResources`]: Engine-wide configuration, clock and telemetry
//! - [`ExecutionContext`]: Mutable per-query state, rebound for every query
//! - [`CircuitBreaker`]: Cooperative cancellation and timeout checks
//! - [`CursorDriver`]: Drains a root cursor into a [`QueryResult`]

mod circuit_breaker;
mod clock;
mod context;
mod local;
mod random;
mod result;
mod security;
mod telemetry;
mod window;

pub use circuit_breaker::{
    AtomicBooleanCircuitBreaker, CancellationFlag, CancellationHandle, CircuitBreaker,
    NoopCircuitBreaker, QueryCircuitBreaker,
};
pub use clock::{ManualClock, MicrosecondClock, SystemClock};
pub use context::{EngineResources, ExecutionContext, QueryBinding};
pub use local::CursorDriver;
pub use random::RandomSource;
pub use result::{QueryResult, ResultRow};
pub use security::{BindVariables, Permission, SecurityContext};
pub use telemetry::{NoopTelemetry, QueueTelemetry, TelemetryEvent, TelemetryOrigin, TelemetrySink};
pub use window::{
    CURRENT_ROW, ExclusionKind, FramingMode, OrderDirection, UNBOUNDED_FOLLOWING,
    UNBOUNDED_PRECEDING, WindowContext, WindowSpec,
};
