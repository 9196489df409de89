use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::lease::Lease;
use super::stmt::PostgresStmt;
use crate::context::Context;
use crate::error::{Result, SqlerError};
use crate::traits::{DriverQueryer, DriverRows, DriverStmt, DriverTx};
use crate::types::{ExecResult, SqlValue};

/// A transaction opened with `BEGIN` on a leased client.
///
/// When the transaction owns its lease (begun on the pool) the client goes
/// back to the pool once it ends. A transaction dropped before commit or
/// rollback poisons the client so it is never reused.
pub struct PostgresTx {
    lease: Arc<Lease>,
    owns_lease: bool,
    done: AtomicBool,
}

impl PostgresTx {
    pub(super) fn new(lease: Arc<Lease>, owns_lease: bool) -> Self {
        Self {
            lease,
            owns_lease,
            done: AtomicBool::new(false),
        }
    }

    fn check(&self) -> Result<()> {
        if self.done.load(Ordering::Acquire) {
            return Err(SqlerError::TxDone);
        }
        Ok(())
    }

    async fn finish(&self, sql: &str) -> Result<()> {
        if self.done.swap(true, Ordering::AcqRel) {
            return Err(SqlerError::TxDone);
        }
        let finished = self.lease.finish(sql).await;
        if !self.owns_lease {
            return finished;
        }
        let released = self.lease.release().await;
        finished.and(released)
    }
}

#[async_trait]
impl DriverQueryer for PostgresTx {
    async fn exec(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Result<ExecResult> {
        self.check()?;
        self.lease.exec(ctx, query, args).await
    }

    async fn prepare(&self, ctx: &Context, query: &str) -> Result<Arc<dyn DriverStmt>> {
        self.check()?;
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
        self.check()?;
        Ok(Box::new(self.lease.query(ctx, query, args).await?))
    }
}

#[async_trait]
impl DriverTx for PostgresTx {
    async fn commit(&self) -> Result<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(&self) -> Result<()> {
        self.finish("ROLLBACK").await
    }

    async fn stmt(&self, ctx: &Context, stmt: &Arc<dyn DriverStmt>) -> Arc<dyn DriverStmt> {
        let query = stmt.query_text();
        if let Err(err) = self.check() {
            return Arc::new(PostgresStmt::failed(query, err));
        }
        match self.lease.prepare(ctx, query, false).await {
            Ok(statement) => Arc::new(PostgresStmt::on_lease(
                Arc::clone(&self.lease),
                statement,
                query,
            )),
            Err(err) => Arc::new(PostgresStmt::failed(query, err)),
        }
    }
}

impl Drop for PostgresTx {
    fn drop(&mut self) {
        if !*self.done.get_mut() {
            tracing::debug!("transaction dropped before commit or rollback");
            self.lease.mark_broken();
        }
    }
}
