use std::mem;

use async_trait::async_trait;

use crate::error::{Result, SqlerError};
use crate::traits::{DriverRows, Row, Rows};
use crate::types::{ColumnType, ScanDest, SqlValue};

/// Cursor adapter over a native row stream.
///
/// Buffers the current row for `scan` and keeps the error that ended
/// iteration. The native stream is released as soon as the last result set is
/// exhausted or fails; `close` stays callable afterwards.
pub struct WrappedRows {
    inner: Box<dyn DriverRows>,
    current: Option<Vec<SqlValue>>,
    err: Option<SqlerError>,
    released: bool,
    closed: bool,
}

impl WrappedRows {
    pub fn new(inner: Box<dyn DriverRows>) -> Self {
        Self {
            inner,
            current: None,
            err: None,
            released: false,
            closed: false,
        }
    }

    async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.current = None;
        if let Err(err) = self.inner.close().await {
            self.err.get_or_insert(err);
        }
        tracing::trace!(failed = self.err.is_some(), "rows released");
    }
}

#[async_trait]
impl Rows for WrappedRows {
    async fn next(&mut self) -> bool {
        if self.closed || self.released {
            return false;
        }
        match self.inner.next().await {
            Ok(Some(row)) => {
                self.current = Some(row);
                true
            }
            Ok(None) => {
                self.current = None;
                if !self.inner.has_next_result_set() {
                    self.release().await;
                }
                false
            }
            Err(err) => {
                self.err = Some(err);
                self.release().await;
                false
            }
        }
    }

    async fn next_result_set(&mut self) -> bool {
        if self.closed || self.released {
            return false;
        }
        self.current = None;
        match self.inner.next_result_set().await {
            Ok(true) => true,
            Ok(false) => {
                self.release().await;
                false
            }
            Err(err) => {
                self.err = Some(err);
                self.release().await;
                false
            }
        }
    }

    fn err(&self) -> Option<&SqlerError> {
        self.err.as_ref()
    }

    fn columns(&self) -> Result<Vec<String>> {
        if self.closed {
            return Err(SqlerError::RowsClosed);
        }
        Ok(self
            .inner
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect())
    }

    fn column_types(&self) -> Result<Vec<ColumnType>> {
        if self.closed {
            return Err(SqlerError::RowsClosed);
        }
        Ok(self.inner.columns().to_vec())
    }

    fn scan(&self, dest: &mut [&mut dyn ScanDest]) -> Result<()> {
        if self.closed {
            return Err(SqlerError::RowsClosed);
        }
        let row = self.current.as_ref().ok_or(SqlerError::NoCurrentRow)?;
        if dest.len() != row.len() {
            return Err(SqlerError::ScanArity {
                expected: row.len(),
                actual: dest.len(),
            });
        }
        let columns = self.inner.columns();
        for (index, (slot, value)) in dest.iter_mut().zip(row).enumerate() {
            slot.scan_value(value).map_err(|err| SqlerError::Scan {
                index,
                column: columns
                    .get(index)
                    .map(|c| c.name().to_string())
                    .unwrap_or_default(),
                source: Box::new(err),
            })?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.current = None;
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.inner.close().await
    }
}

/// A single-row result: either a pending cursor or an error captured when the
/// query was issued.
pub enum DeferredRow {
    Pending(WrappedRows),
    Failed(SqlerError),
    Consumed,
}

#[async_trait]
impl Row for DeferredRow {
    async fn scan(&mut self, dest: &mut [&mut dyn ScanDest]) -> Result<()> {
        let mut rows = match mem::replace(self, DeferredRow::Consumed) {
            DeferredRow::Pending(rows) => rows,
            DeferredRow::Failed(err) => {
                *self = DeferredRow::Failed(err.clone());
                return Err(err);
            }
            DeferredRow::Consumed => return Err(SqlerError::RowsClosed),
        };

        if !rows.next().await {
            let err = rows.err().cloned().unwrap_or(SqlerError::NoRows);
            rows.close().await?;
            return Err(err);
        }
        let scanned = rows.scan(dest);
        let closed = rows.close().await;
        scanned.and(closed)
    }
}
