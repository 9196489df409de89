use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use tokio_postgres::{RowStream, SimpleColumn, SimpleQueryMessage, Statement};

use super::lease::Lease;
use super::value::{column_type, decode_row};
use crate::context::Context;
use crate::error::{Result, SqlerError};
use crate::traits::DriverRows;
use crate::types::{ColumnType, ResultSet, SqlValue};

enum Source {
    /// One result set read from the server as it is consumed.
    Streamed {
        ctx: Context,
        stream: Pin<Box<RowStream>>,
        lease: Arc<Lease>,
    },
    /// Result sets of a simple query, already read in full.
    Buffered {
        rows: VecDeque<Vec<SqlValue>>,
        pending: VecDeque<ResultSet>,
    },
    Closed,
}

/// Rows of a query. Parameterized queries stream a single result set and
/// hold their client until closed; parameterless queries may carry several.
pub struct PostgresRows {
    columns: Vec<ColumnType>,
    source: Source,
}

impl PostgresRows {
    pub(super) fn streamed(
        ctx: Context,
        statement: &Statement,
        stream: RowStream,
        lease: Arc<Lease>,
    ) -> Self {
        Self {
            columns: statement.columns().iter().map(column_type).collect(),
            source: Source::Streamed {
                ctx,
                stream: Box::pin(stream),
                lease,
            },
        }
    }

    pub(super) fn buffered(sets: Vec<ResultSet>) -> Self {
        let mut pending: VecDeque<ResultSet> = sets.into();
        let first = pending.pop_front().unwrap_or_default();
        Self {
            columns: first.columns,
            source: Source::Buffered {
                rows: first.rows.into(),
                pending,
            },
        }
    }
}

/// Splits simple query responses into result sets. Every value arrives in
/// text form.
pub(super) fn result_sets(messages: Vec<SimpleQueryMessage>) -> Vec<ResultSet> {
    let mut sets = Vec::new();
    let mut current: Option<ResultSet> = None;
    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                sets.extend(current.take());
                current = Some(ResultSet::new(text_columns(columns.iter()), Vec::new()));
            }
            SimpleQueryMessage::Row(row) => {
                let set = current.get_or_insert_with(|| {
                    ResultSet::new(text_columns(row.columns().iter()), Vec::new())
                });
                let values = (0..row.len())
                    .map(|idx| match row.get(idx) {
                        Some(text) => SqlValue::Text(text.to_string()),
                        None => SqlValue::Null,
                    })
                    .collect();
                set.rows.push(values);
            }
            SimpleQueryMessage::CommandComplete(_) => sets.extend(current.take()),
            _ => {}
        }
    }
    sets.extend(current);
    if sets.is_empty() {
        sets.push(ResultSet::empty());
    }
    sets
}

fn text_columns<'a>(columns: impl Iterator<Item = &'a SimpleColumn>) -> Vec<ColumnType> {
    columns
        .map(|column| ColumnType::new(column.name(), "TEXT"))
        .collect()
}

#[async_trait]
impl DriverRows for PostgresRows {
    fn columns(&self) -> &[ColumnType] {
        &self.columns
    }

    async fn next(&mut self) -> Result<Option<Vec<SqlValue>>> {
        match &mut self.source {
            Source::Streamed { ctx, stream, lease } => {
                let row = lease
                    .guard(ctx, async { stream.try_next().await.map_err(SqlerError::from) })
                    .await?;
                row.as_ref().map(decode_row).transpose()
            }
            Source::Buffered { rows, .. } => Ok(rows.pop_front()),
            Source::Closed => Err(SqlerError::RowsClosed),
        }
    }

    fn has_next_result_set(&self) -> bool {
        matches!(&self.source, Source::Buffered { pending, .. } if !pending.is_empty())
    }

    async fn next_result_set(&mut self) -> Result<bool> {
        match &mut self.source {
            Source::Buffered { rows, pending } => {
                let Some(set) = pending.pop_front() else {
                    return Ok(false);
                };
                *rows = set.rows.into();
                self.columns = set.columns;
                Ok(true)
            }
            Source::Streamed { .. } => Ok(false),
            Source::Closed => Err(SqlerError::RowsClosed),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.source = Source::Closed;
        Ok(())
    }
}
