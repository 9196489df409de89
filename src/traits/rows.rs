use async_trait::async_trait;

use crate::error::{Result, SqlerError};
use crate::types::{ColumnType, ScanDest};

/// A forward-only cursor over one or more result sets.
#[async_trait]
pub trait Rows: Send {
    /// Advances to the next row. `false` means the stream ended or failed;
    /// check [`Rows::err`] to tell which.
    async fn next(&mut self) -> bool;

    /// Advances to the next result set, if the query produced more than one.
    async fn next_result_set(&mut self) -> bool;

    /// The error that stopped iteration, if any.
    fn err(&self) -> Option<&SqlerError>;

    fn columns(&self) -> Result<Vec<String>>;

    fn column_types(&self) -> Result<Vec<ColumnType>>;

    /// Copies the current row into `dest`, one destination per column.
    fn scan(&self, dest: &mut [&mut dyn ScanDest]) -> Result<()>;

    /// Safe to call more than once and after exhaustion.
    async fn close(&mut self) -> Result<()>;
}

/// A deferred single-row result.
#[async_trait]
pub trait Row: Send {
    async fn scan(&mut self, dest: &mut [&mut dyn ScanDest]) -> Result<()>;
}
