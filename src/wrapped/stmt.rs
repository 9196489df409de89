use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::traits::{DriverStmt, Row, Rows, Stmt};
use crate::types::{ExecResult, SqlValue};
use crate::wrapped::{DeferredRow, WrappedRows};

pub struct WrappedStmt {
    inner: Arc<dyn DriverStmt>,
}

impl WrappedStmt {
    pub fn new(inner: Arc<dyn DriverStmt>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Stmt for WrappedStmt {
    async fn exec(&self, ctx: &Context, args: &[SqlValue]) -> Result<ExecResult> {
        self.inner.exec(ctx, args).await
    }

    async fn query(&self, ctx: &Context, args: &[SqlValue]) -> Result<Box<dyn Rows>> {
        let rows = self.inner.query(ctx, args).await?;
        Ok(Box::new(WrappedRows::new(rows)))
    }

    async fn query_row(&self, ctx: &Context, args: &[SqlValue]) -> Box<dyn Row> {
        let row = match self.inner.query(ctx, args).await {
            Ok(rows) => DeferredRow::Pending(WrappedRows::new(rows)),
            Err(err) => DeferredRow::Failed(err),
        };
        Box::new(row)
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }

    fn query_text(&self) -> &str {
        self.inner.query_text()
    }

    fn native(&self) -> &Arc<dyn DriverStmt> {
        &self.inner
    }
}
