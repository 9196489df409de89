use std::sync::Arc;

use async_trait::async_trait;

use super::lease::Lease;
use super::stmt::PostgresStmt;
use super::tx::PostgresTx;
use crate::context::Context;
use crate::error::Result;
use crate::traits::{DriverConn, DriverQueryer, DriverRows, DriverStmt, DriverTx};
use crate::types::{ExecResult, SqlValue, TxOptions};

/// A client leased from a [`super::PostgresPool`] until `close`.
pub struct PostgresConn {
    lease: Arc<Lease>,
}

impl PostgresConn {
    pub(super) fn new(lease: Arc<Lease>) -> Self {
        Self { lease }
    }
}

#[async_trait]
impl DriverQueryer for PostgresConn {
    async fn exec(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Result<ExecResult> {
        self.lease.exec(ctx, query, args).await
    }

    async fn prepare(&self, ctx: &Context, query: &str) -> Result<Arc<dyn DriverStmt>> {
        let statement = self.lease.prepare(ctx, query, false).await?;
        Ok(Arc::new(PostgresStmt::on_lease(
            Arc::clone(&self.lease),
            statement,
            query,
        )))
    }

    async fn query(
        &self,
        ctx: &Context,
        query: &str,
        args: &[SqlValue],
    ) -> Result<Box<dyn DriverRows>> {
        Ok(Box::new(self.lease.query(ctx, query, args).await?))
    }
}

#[async_trait]
impl DriverConn for PostgresConn {
    async fn begin_tx(&self, ctx: &Context, opts: &TxOptions) -> Result<Arc<dyn DriverTx>> {
        self.lease.begin(ctx, opts).await?;
        Ok(Arc::new(PostgresTx::new(Arc::clone(&self.lease), false)))
    }

    async fn close(&self) -> Result<()> {
        self.lease.release().await
    }

    async fn ping(&self, ctx: &Context) -> Result<()> {
        self.lease.ping(ctx).await
    }
}
