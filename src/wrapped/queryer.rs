use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::traits::{DriverQueryer, Queryer, Row, Rows, Stmt};
use crate::types::{ExecResult, SqlValue};
use crate::wrapped::{DeferredRow, WrappedRows, WrappedStmt};

/// The shared forwarding base for every query-capable adapter.
pub struct WrappedQueryer<Q: ?Sized> {
    inner: Arc<Q>,
}

impl<Q: ?Sized> WrappedQueryer<Q> {
    pub(crate) fn new(inner: Arc<Q>) -> Self {
        Self { inner }
    }
}

impl<Q: ?Sized> Clone for WrappedQueryer<Q> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl<Q> Queryer for WrappedQueryer<Q>
where
    Q: DriverQueryer + ?Sized,
{
    async fn exec(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Result<ExecResult> {
        self.inner.exec(ctx, query, args).await
    }

    async fn prepare(&self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>> {
        let stmt = self.inner.prepare(ctx, query).await?;
        Ok(Box::new(WrappedStmt::new(stmt)))
    }

    async fn query(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Result<Box<dyn Rows>> {
        let rows = self.inner.query(ctx, query, args).await?;
        Ok(Box::new(WrappedRows::new(rows)))
    }

    async fn query_row(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Box<dyn Row> {
        let row = match self.inner.query(ctx, query, args).await {
            Ok(rows) => DeferredRow::Pending(WrappedRows::new(rows)),
            Err(err) => DeferredRow::Failed(err),
        };
        Box::new(row)
    }
}
