use crate::error::{Result, SqlerError};

/// Summary of a statement that produced no row set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    rows_affected: u64,
    last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    pub fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Fails with [`SqlerError::Unsupported`] when the driver reported no id.
    pub fn last_insert_id(&self) -> Result<i64> {
        self.last_insert_id
            .ok_or(SqlerError::Unsupported("LastInsertId"))
    }
}
