//! Per-query execution context.
//!
//! One [`ExecutionContext`] lives in each worker slot and is rebound with
//! [`ExecutionContext::bind`] at the start of every query that runs on the
//! slot. Operators borrow it read-mostly for the duration of the query.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use common_config::{EngineConfig, JitMode};
use common_display::{Describe, PlanSink};
use common_error::QuarryResult;
use quarry_storage::{MemoryTable, PageFrameCursor, ScanDirection};

use crate::executor::circuit_breaker::{
    AtomicBooleanCircuitBreaker, CancellationFlag, CircuitBreaker, NoopCircuitBreaker,
    QueryCircuitBreaker,
};
use crate::executor::clock::{MicrosecondClock, SystemClock};
use crate::executor::random::RandomSource;
use crate::executor::security::{BindVariables, SecurityContext};
use crate::executor::telemetry::{NoopTelemetry, TelemetryEvent, TelemetryOrigin, TelemetrySink};
use crate::executor::window::{WindowContext, WindowSpec};

const REDACTED: &str = "*****";

// ============================================================================
// Engine resources
// ============================================================================

/// Process-wide collaborators shared by every context of an engine.
#[derive(Debug, Clone)]
pub struct EngineResources {
    config: Arc<EngineConfig>,
    clock: Arc<dyn MicrosecondClock>,
    shared_random: RandomSource,
    telemetry: Arc<dyn TelemetrySink>,
}

impl EngineResources {
    /// Validate `config` and create resources with the wall clock. Events are
    /// discarded until a sink is installed with
    /// [`with_telemetry`](Self::with_telemetry).
    pub fn new(config: EngineConfig) -> QuarryResult<Self> {
        config.validate()?;
        let shared_random = RandomSource::from_config(&config.random);
        Ok(Self {
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
            shared_random,
            telemetry: Arc::new(NoopTelemetry),
        })
    }

    /// Use `clock` for `now()` and time budgets.
    pub fn with_clock(mut self, clock: Arc<dyn MicrosecondClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `sink` for telemetry when telemetry is enabled.
    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = sink;
        self
    }

    /// Use `random` as the fallback random source.
    pub fn with_shared_random(mut self, random: RandomSource) -> Self {
        self.shared_random = random;
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a context for one worker slot.
    pub fn new_context(&self) -> ExecutionContext {
        ExecutionContext::new(self)
    }
}

// ============================================================================
// Query binding
// ============================================================================

/// Per-query identity and state handed to [`ExecutionContext::bind`].
#[derive(Debug, Clone, Default)]
pub struct QueryBinding {
    security: SecurityContext,
    bind_variables: BindVariables,
    random_seed: Option<u64>,
    request_fd: Option<i64>,
    cancellation: Option<CancellationFlag>,
    circuit_breaker: Option<Arc<dyn CircuitBreaker>>,
}

impl QueryBinding {
    /// Binding for `security`.
    pub fn new(security: SecurityContext) -> Self {
        Self {
            security,
            ..Self::default()
        }
    }

    /// Bind variables of the statement.
    pub fn bind_variables(mut self, bind_variables: BindVariables) -> Self {
        self.bind_variables = bind_variables;
        self
    }

    /// Seed a query-local random source.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Connection handle used in diagnostics.
    pub fn request_fd(mut self, fd: i64) -> Self {
        self.request_fd = Some(fd);
        self
    }

    /// Flag that cancels the query.
    pub fn cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Breaker to use instead of one derived from the configuration.
    pub fn circuit_breaker(mut self, cb: Arc<dyn CircuitBreaker>) -> Self {
        self.circuit_breaker = Some(cb);
        self
    }
}

// ============================================================================
// Execution context
// ============================================================================

/// Mutable per-query state threaded through every operator of one query.
///
/// The context is created once per worker slot, rebound for every query and
/// never shared by two queries at once.
pub struct ExecutionContext {
    config: Arc<EngineConfig>,
    security: SecurityContext,
    bind_variables: BindVariables,
    circuit_breaker: Arc<dyn CircuitBreaker>,
    simple_circuit_breaker: Arc<AtomicBooleanCircuitBreaker>,
    use_simple_circuit_breaker: bool,
    clock: Arc<dyn MicrosecondClock>,
    now: Option<i64>,
    clock_fixed: bool,
    random: Option<RandomSource>,
    shared_random: RandomSource,
    window_context: WindowContext,
    timestamp_required: Vec<bool>,
    cache_hit: bool,
    contains_secret: bool,
    allow_non_deterministic_functions: bool,
    column_pre_touch_enabled: bool,
    clone_symbol_tables: bool,
    jit_mode: JitMode,
    parallel_filter_enabled: bool,
    parallel_group_by_enabled: bool,
    parallel_read_parquet_enabled: bool,
    request_fd: Option<i64>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("principal", &self.redact(self.security.principal()))
            .field("request_fd", &self.request_fd)
            .field("now", &self.now)
            .field("cache_hit", &self.cache_hit)
            .field("contains_secret", &self.contains_secret)
            .field("jit_mode", &self.jit_mode)
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    /// Create an unbound context. Its security context denies everything
    /// until [`bind`](Self::bind) is called.
    pub fn new(resources: &EngineResources) -> Self {
        let config = Arc::clone(&resources.config);
        let telemetry: Arc<dyn TelemetrySink> = if config.telemetry.enabled {
            Arc::clone(&resources.telemetry)
        } else {
            Arc::new(NoopTelemetry)
        };
        Self {
            security: SecurityContext::deny_all(),
            bind_variables: BindVariables::new(),
            circuit_breaker: Arc::new(NoopCircuitBreaker),
            simple_circuit_breaker: Arc::new(AtomicBooleanCircuitBreaker::new(
                config.circuit_breaker.throttle,
            )),
            use_simple_circuit_breaker: false,
            clock: Arc::clone(&resources.clock),
            now: None,
            clock_fixed: false,
            random: None,
            shared_random: resources.shared_random.clone(),
            window_context: WindowContext::default(),
            timestamp_required: Vec::new(),
            cache_hit: false,
            contains_secret: false,
            allow_non_deterministic_functions: true,
            column_pre_touch_enabled: config.sql.column_pre_touch_enabled,
            clone_symbol_tables: false,
            jit_mode: config.sql.jit_mode,
            parallel_filter_enabled: config.parallel_filter_enabled(),
            parallel_group_by_enabled: config.parallel_group_by_enabled(),
            parallel_read_parquet_enabled: config.parallel_read_parquet_enabled(),
            request_fd: None,
            telemetry,
            config,
        }
    }

    // ------------------------------------------------------------------------
    // Binding
    // ------------------------------------------------------------------------

    /// Rebind the context to a new query.
    ///
    /// Identity, bind variables, random seed, connection handle and
    /// cancellation flag are replaced. Transient flags return to their
    /// defaults, the clock is unpinned, the timestamp stack and window
    /// context are cleared and the breakers are reset.
    pub fn bind(&mut self, binding: QueryBinding) -> &mut Self {
        let QueryBinding {
            security,
            bind_variables,
            random_seed,
            request_fd,
            cancellation,
            circuit_breaker,
        } = binding;

        self.security = security;
        self.bind_variables = bind_variables;
        self.random = random_seed.map(RandomSource::seeded);
        self.request_fd = request_fd;
        self.circuit_breaker = circuit_breaker.unwrap_or_else(|| self.default_circuit_breaker());

        let flag = cancellation.unwrap_or_default();
        self.set_cancelled_flag(flag);

        self.reset_flags();
        self.now = None;
        self.clock_fixed = false;
        self.timestamp_required.clear();
        self.window_context.clear();
        self.circuit_breaker.reset_timer();
        self.simple_circuit_breaker.reset_timer();

        log::debug!(
            "bound execution context [fd={:?}, seeded={}]",
            self.request_fd,
            random_seed.is_some()
        );
        self
    }

    /// Replace only the connection handle; transient flags are reset.
    pub fn with_request_fd(&mut self, fd: i64) -> &mut Self {
        self.request_fd = Some(fd);
        self.reset_flags();
        self
    }

    fn default_circuit_breaker(&self) -> Arc<dyn CircuitBreaker> {
        let cfg = &self.config.circuit_breaker;
        if cfg.enabled {
            Arc::new(QueryCircuitBreaker::new(
                Arc::clone(&self.clock),
                cfg.throttle,
                cfg.query_timeout_micros,
            ))
        } else {
            Arc::new(NoopCircuitBreaker)
        }
    }

    fn reset_flags(&mut self) {
        self.cache_hit = false;
        self.contains_secret = false;
        self.column_pre_touch_enabled = self.config.sql.column_pre_touch_enabled;
        self.allow_non_deterministic_functions = true;
        self.use_simple_circuit_breaker = false;
    }

    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open a frame cursor over `table` whose frames hold at most
    /// `sql.page_frame_max_rows` rows.
    pub fn page_frame_cursor(
        &self,
        table: &MemoryTable,
        direction: ScanDirection,
    ) -> Box<dyn PageFrameCursor> {
        Box::new(table.cursor_capped(direction, self.config.sql.page_frame_max_rows))
    }

    /// Security context of the bound principal.
    pub fn security_context(&self) -> &SecurityContext {
        &self.security
    }

    /// Bind variables of the current statement.
    pub fn bind_variables(&self) -> &BindVariables {
        &self.bind_variables
    }

    /// Connection handle used in diagnostics.
    pub fn request_fd(&self) -> Option<i64> {
        self.request_fd
    }

    /// `text`, or a mask while the query touches secrets.
    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.contains_secret {
            Cow::Borrowed(REDACTED)
        } else {
            Cow::Borrowed(text)
        }
    }

    // ------------------------------------------------------------------------
    // Circuit breakers
    // ------------------------------------------------------------------------

    /// Breaker for the current query: the simple one when selected,
    /// otherwise the full one. Never absent.
    pub fn circuit_breaker(&self) -> Arc<dyn CircuitBreaker> {
        if self.use_simple_circuit_breaker {
            let simple: Arc<dyn CircuitBreaker> = self.simple_circuit_breaker.clone();
            simple
        } else {
            Arc::clone(&self.circuit_breaker)
        }
    }

    /// Replace the full breaker.
    pub fn set_circuit_breaker(&mut self, cb: Arc<dyn CircuitBreaker>) {
        self.circuit_breaker = cb;
    }

    /// Select the flag-only breaker for the current query.
    pub fn set_use_simple_circuit_breaker(&mut self, value: bool) {
        self.use_simple_circuit_breaker = value;
    }

    /// Whether the flag-only breaker is selected.
    pub fn use_simple_circuit_breaker(&self) -> bool {
        self.use_simple_circuit_breaker
    }

    /// Install `flag` in both breakers.
    pub fn set_cancelled_flag(&mut self, flag: CancellationFlag) {
        self.circuit_breaker.set_cancelled_flag(flag.clone());
        self.simple_circuit_breaker.set_cancelled_flag(flag);
    }

    // ------------------------------------------------------------------------
    // Timestamp-required stack
    // ------------------------------------------------------------------------

    /// Enter a scope that does (or does not) require a timestamp column.
    pub fn push_timestamp_required(&mut self, flag: bool) {
        self.timestamp_required.push(flag);
    }

    /// Leave the innermost scope.
    pub fn pop_timestamp_required(&mut self) {
        self.timestamp_required.pop();
    }

    /// Whether the innermost scope requires a timestamp; `false` outside any
    /// scope.
    pub fn is_timestamp_required(&self) -> bool {
        self.timestamp_required.last().copied().unwrap_or(false)
    }

    /// Number of open scopes.
    pub fn timestamp_required_depth(&self) -> usize {
        self.timestamp_required.len()
    }

    /// Run `f` inside a timestamp scope. The scope is closed whether `f`
    /// succeeds or fails.
    pub fn with_timestamp_required<T>(
        &mut self,
        flag: bool,
        f: impl FnOnce(&mut Self) -> QuarryResult<T>,
    ) -> QuarryResult<T> {
        self.push_timestamp_required(flag);
        let result = f(self);
        self.pop_timestamp_required();
        result
    }

    // ------------------------------------------------------------------------
    // Time and randomness
    // ------------------------------------------------------------------------

    /// Logical "now" in microseconds: the pinned value, or the live clock.
    pub fn now(&self) -> i64 {
        self.now.unwrap_or_else(|| self.clock.ticks())
    }

    /// Snapshot the current clock reading as `now`. No-op while the clock
    /// is fixed.
    pub fn init_now(&mut self) {
        if !self.clock_fixed {
            self.now = Some(self.clock.ticks());
        }
    }

    /// Fix the clock at `micros` until the next [`bind`](Self::bind).
    pub fn set_now_and_fix_clock(&mut self, micros: i64) {
        self.now = Some(micros);
        self.clock_fixed = true;
    }

    /// Whether the clock is fixed by
    /// [`set_now_and_fix_clock`](Self::set_now_and_fix_clock).
    pub fn is_clock_fixed(&self) -> bool {
        self.clock_fixed
    }

    /// Clock reading in microseconds: the fixed value while the clock is
    /// fixed, otherwise the live clock.
    pub fn microsecond_timestamp(&self) -> i64 {
        match self.now {
            Some(now) if self.clock_fixed => now,
            _ => self.clock.ticks(),
        }
    }

    /// Query-local random source, or the shared one.
    pub fn random(&self) -> &RandomSource {
        self.random.as_ref().unwrap_or(&self.shared_random)
    }

    /// Replace the query-local random source.
    pub fn set_random(&mut self, random: Option<RandomSource>) {
        self.random = random;
    }

    // ------------------------------------------------------------------------
    // Window functions
    // ------------------------------------------------------------------------

    /// Validate and bind the window spec of the function being compiled.
    pub fn configure_window_context(&mut self, spec: WindowSpec) -> QuarryResult<()> {
        self.window_context.configure(spec)
    }

    /// Drop the window spec.
    pub fn clear_window_context(&mut self) {
        self.window_context.clear();
    }

    /// Current window context.
    pub fn window_context(&self) -> &WindowContext {
        &self.window_context
    }

    // ------------------------------------------------------------------------
    // Telemetry
    // ------------------------------------------------------------------------

    /// Forward an event to the telemetry sink.
    pub fn store_telemetry(&self, event: TelemetryEvent, origin: TelemetryOrigin) {
        self.telemetry.store(event, origin);
    }

    // ------------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------------

    pub fn is_cache_hit(&self) -> bool {
        self.cache_hit
    }

    pub fn set_cache_hit(&mut self, value: bool) {
        self.cache_hit = value;
    }

    pub fn contains_secret(&self) -> bool {
        self.contains_secret
    }

    pub fn set_contains_secret(&mut self, value: bool) {
        self.contains_secret = value;
    }

    pub fn allow_non_deterministic_functions(&self) -> bool {
        self.allow_non_deterministic_functions
    }

    pub fn set_allow_non_deterministic_functions(&mut self, value: bool) {
        self.allow_non_deterministic_functions = value;
    }

    pub fn is_column_pre_touch_enabled(&self) -> bool {
        self.column_pre_touch_enabled
    }

    /// Override column pre-touch for the current query.
    pub fn set_column_pre_touch_enabled(&mut self, value: bool) {
        self.column_pre_touch_enabled = value;
    }

    pub fn clone_symbol_tables(&self) -> bool {
        self.clone_symbol_tables
    }

    pub fn set_clone_symbol_tables(&mut self, value: bool) {
        self.clone_symbol_tables = value;
    }

    pub fn jit_mode(&self) -> JitMode {
        self.jit_mode
    }

    pub fn set_jit_mode(&mut self, mode: JitMode) {
        self.jit_mode = mode;
    }

    pub fn is_parallel_filter_enabled(&self) -> bool {
        self.parallel_filter_enabled
    }

    pub fn set_parallel_filter_enabled(&mut self, value: bool) {
        self.parallel_filter_enabled = value;
    }

    pub fn is_parallel_group_by_enabled(&self) -> bool {
        self.parallel_group_by_enabled
    }

    pub fn set_parallel_group_by_enabled(&mut self, value: bool) {
        self.parallel_group_by_enabled = value;
    }

    pub fn is_parallel_read_parquet_enabled(&self) -> bool {
        self.parallel_read_parquet_enabled
    }

    pub fn set_parallel_read_parquet_enabled(&mut self, value: bool) {
        self.parallel_read_parquet_enabled = value;
    }

    /// Worker count of the shared query pool.
    pub fn shared_query_worker_count(&self) -> usize {
        self.config.shared_query_worker_count
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "principal={}, cache={}",
            self.redact(self.security.principal()),
            self.cache_hit
        )
    }
}

impl Describe for ExecutionContext {
    fn describe(&self, sink: &mut PlanSink) {
        sink.type_("ExecutionContext")
            .attr("principal", self.redact(self.security.principal()))
            .attr("cache", self.cache_hit);
    }
}

// ============================================================================
// Tests
// ============================================================================
