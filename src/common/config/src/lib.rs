//! Configuration management for Quarry.
//!
//! Provides the engine-wide configuration snapshot from which every
//! per-query execution context takes its defaults.

use std::path::Path;

use common_error::{QuarryResult, ensure};
use serde::{Deserialize, Serialize};

/// Global Quarry configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQL execution configuration.
    pub sql: SqlConfig,
    /// Circuit breaker configuration.
    pub circuit_breaker: CircuitBreakerConfig,
    /// Telemetry configuration.
    pub telemetry: TelemetryConfig,
    /// Shared random source configuration.
    pub random: RandomConfig,
    /// Number of workers in the shared query pool. Parallel execution
    /// flags only take effect when this is non-zero.
    pub shared_query_worker_count: usize,
}

impl EngineConfig {
    /// Parse a configuration from a JSON document and validate it.
    pub fn from_json_str(json: &str) -> QuarryResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> QuarryResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> QuarryResult<()> {
        ensure!(
            self.sql.page_frame_max_rows > 0,
            InvalidConfig: "sql.page_frame_max_rows must be positive"
        );
        ensure!(
            self.circuit_breaker.throttle > 0,
            InvalidConfig: "circuit_breaker.throttle must be positive"
        );
        ensure!(
            self.circuit_breaker.query_timeout_micros >= 0,
            InvalidConfig: "circuit_breaker.query_timeout_micros must not be negative, got {}",
            self.circuit_breaker.query_timeout_micros
        );
        Ok(())
    }

    /// Parallel filtering is effective only with a shared worker pool.
    pub fn parallel_filter_enabled(&self) -> bool {
        self.sql.parallel_filter_enabled && self.shared_query_worker_count > 0
    }

    /// Parallel group-by is effective only with a shared worker pool.
    pub fn parallel_group_by_enabled(&self) -> bool {
        self.sql.parallel_group_by_enabled && self.shared_query_worker_count > 0
    }

    /// Parallel parquet reads are effective only with a shared worker pool.
    pub fn parallel_read_parquet_enabled(&self) -> bool {
        self.sql.parallel_read_parquet_enabled && self.shared_query_worker_count > 0
    }
}

/// JIT compilation mode for filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JitMode {
    /// Vectorized JIT filters.
    #[default]
    Enabled,
    /// Scalar JIT filters only.
    Scalar,
    /// Interpreted filters.
    Disabled,
}

/// SQL execution configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    /// Filter compilation mode.
    pub jit_mode: JitMode,
    /// Allow filters to fan out across the shared worker pool.
    pub parallel_filter_enabled: bool,
    /// Allow group-by to fan out across the shared worker pool.
    pub parallel_group_by_enabled: bool,
    /// Allow parquet partitions to be decoded in parallel.
    pub parallel_read_parquet_enabled: bool,
    /// Touch column pages ahead of the scan.
    pub column_pre_touch_enabled: bool,
    /// Upper bound on rows per page frame.
    pub page_frame_max_rows: usize,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            jit_mode: JitMode::Enabled,
            parallel_filter_enabled: true,
            parallel_group_by_enabled: true,
            parallel_read_parquet_enabled: true,
            column_pre_touch_enabled: true,
            page_frame_max_rows: 1_000_000,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Attach a full circuit breaker to each query.
    pub enabled: bool,
    /// Number of checks between reads of the flag and the clock.
    pub throttle: u32,
    /// Time budget per query in microseconds (0 = unlimited).
    pub query_timeout_micros: i64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            throttle: 100,
            query_timeout_micros: 60_000_000,
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Forward telemetry events to the sink.
    pub enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Shared random source configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomConfig {
    /// Seed for the process-wide source; entropy-seeded when absent.
    pub seed: Option<u64>,
}
