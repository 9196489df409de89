use crate::types::{ColumnType, SqlValue};

/// One fully materialized result set: column metadata plus rows of values in
/// column order. Drivers that buffer their output hand these to the cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<ColumnType>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl ResultSet {
    pub fn new(columns: Vec<ColumnType>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// Returns the number of rows in this result set.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if this result set contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
