//! Core error types for Quarry.

use thiserror::Error;

/// Result type alias using `QuarryError`.
pub type QuarryResult<T> = std::result::Result<T, QuarryError>;

/// Core error type for Quarry operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuarryError {
    /// The query was cancelled through its cancellation flag.
    #[error("QueryCancelled: {reason}")]
    QueryCancelled {
        /// Why the breaker tripped.
        reason: String,
    },

    /// The query exceeded its time budget.
    #[error("QueryTimedOut: exceeded {timeout_micros}us")]
    QueryTimedOut {
        /// The configured budget in microseconds.
        timeout_micros: i64,
    },

    /// Invalid bind-time configuration (window frames, bind variables).
    #[error("BindError at position {position}: {message}")]
    BindError {
        /// Position in the statement the error refers to.
        position: i32,
        /// Description of the problem.
        message: String,
    },

    /// The principal may not run the statement.
    #[error("PermissionDenied: {0}")]
    PermissionDenied(String),

    /// Invalid or inconsistent engine configuration.
    #[error("InvalidConfig: {0}")]
    InvalidConfig(String),

    /// Storage layer error.
    #[error("StorageError: {0}")]
    StorageError(String),

    /// Query execution error.
    #[error("ExecutionError: {0}")]
    ExecutionError(String),

    /// Type mismatch while reading a column.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Column not found in the frame schema.
    #[error("ColumnNotFound: {0}")]
    ColumnNotFound(String),

    /// Internal error (bug in Quarry).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// IO error.
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),

    /// Arrow error.
    #[error("ArrowError: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl QuarryError {
    /// Create a cancellation error.
    pub fn cancelled<S: Into<String>>(reason: S) -> Self {
        Self::QueryCancelled {
            reason: reason.into(),
        }
    }

    /// Create a timeout error.
    pub fn timed_out(timeout_micros: i64) -> Self {
        Self::QueryTimedOut { timeout_micros }
    }

    /// Create a bind-time error.
    pub fn bind<S: Into<String>>(position: i32, msg: S) -> Self {
        Self::BindError {
            position,
            message: msg.into(),
        }
    }

    /// Create a new `PermissionDenied` error.
    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create a new `InvalidConfig` error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new `StorageError`.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::StorageError(msg.into())
    }

    /// Create a new `ExecutionError`.
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionError(msg.into())
    }

    /// Create a new `TypeError`.
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a new `ColumnNotFound` error.
    pub fn column_not_found<S: Into<String>>(msg: S) -> Self {
        Self::ColumnNotFound(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Whether this error is a cancellation or timeout raised by a circuit
    /// breaker, i.e. the query did not complete.
    pub fn is_interruption(&self) -> bool {
        matches!(self, Self::QueryCancelled { .. } | Self::QueryTimedOut { .. })
    }

    /// Whether this error was detected at bind time, before any row was read.
    pub fn is_bind_time(&self) -> bool {
        matches!(self, Self::BindError { .. } | Self::InvalidConfig(_))
    }
}

/// Ensure a condition holds, returning an `ExecutionError` if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::QuarryError::ExecutionError($msg.to_string()));
        }
    };
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::QuarryError::$variant(format!($($msg)*)));
        }
    };
}
