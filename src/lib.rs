//! Quarry - row-iteration core of a columnar SQL query engine
//!
//! Quarry pulls rows out of partitioned, column-oriented storage through
//! composable record cursors, under a per-query execution context that
//! carries identity, clock pinning and cooperative cancellation.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export core crates
pub use common_config as config;
pub use common_display as display;
pub use common_error as error;
pub use quarry_engine as engine;
pub use quarry_storage as storage;

/// Quarry version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
