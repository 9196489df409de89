use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Error type for sqler operations.
///
/// Cloneable so that a deferred row can hand back the same captured error on
/// every `scan`.
#[derive(Debug, Clone, Error)]
pub enum SqlerError {
    #[error("Unknown driver {0:?}")]
    UnknownDriver(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An error reported by the native driver, passed through untouched.
    #[error(transparent)]
    Driver(Arc<dyn StdError + Send + Sync>),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("No rows in result set")]
    NoRows,

    #[error("Database is closed")]
    DatabaseClosed,

    #[error("Connection is already closed")]
    ConnDone,

    #[error("Bad connection")]
    BadConn,

    #[error("Transaction has already been committed or rolled back")]
    TxDone,

    #[error("Statement is closed")]
    StmtClosed,

    #[error("Rows are closed")]
    RowsClosed,

    #[error("Scan called without calling next")]
    NoCurrentRow,

    #[error("Expected {expected} destination arguments in scan, got {actual}")]
    ScanArity { expected: usize, actual: usize },

    #[error("Scan error on column index {index}, name {column:?}: {source}")]
    Scan {
        index: usize,
        column: String,
        source: Box<SqlerError>,
    },

    #[error("Cannot convert {found} into {expected}")]
    Conversion { found: String, expected: &'static str },

    #[error("{0} is not supported by this driver")]
    Unsupported(&'static str),

    #[error("Context canceled")]
    Canceled,

    #[error("Context deadline exceeded")]
    DeadlineExceeded,
}

impl SqlerError {
    /// Wraps a native driver error without altering it.
    pub fn driver<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        SqlerError::Driver(Arc::new(err))
    }

    /// True for the "zero rows" outcome of a single-row query.
    pub fn is_no_rows(&self) -> bool {
        matches!(self, SqlerError::NoRows)
    }

    /// Downcasts a driver error to its native type.
    pub fn driver_error<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            SqlerError::Driver(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Result type alias for sqler operations
pub type Result<T> = std::result::Result<T, SqlerError>;
