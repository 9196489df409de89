use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_postgres::Statement;

use super::lease::Lease;
use super::pool::PoolShared;
use crate::context::Context;
use crate::error::{Result, SqlerError};
use crate::traits::{DriverRows, DriverStmt};
use crate::types::{ExecResult, SqlValue};

enum Binding {
    /// Prepared again, from the client cache, on whichever client runs it.
    Pool(Arc<PoolShared>),
    Lease {
        lease: Arc<Lease>,
        statement: Statement,
    },
    /// Rebinding failed; every use reports the error.
    Failed(SqlerError),
}

pub struct PostgresStmt {
    query: String,
    binding: Binding,
    closed: AtomicBool,
}

impl PostgresStmt {
    fn with_binding(query: &str, binding: Binding) -> Self {
        Self {
            query: query.to_string(),
            binding,
            closed: AtomicBool::new(false),
        }
    }

    pub(super) fn on_pool(shared: Arc<PoolShared>, query: &str) -> Self {
        Self::with_binding(query, Binding::Pool(shared))
    }

    pub(super) fn on_lease(lease: Arc<Lease>, statement: Statement, query: &str) -> Self {
        Self::with_binding(query, Binding::Lease { lease, statement })
    }

    pub(super) fn failed(query: &str, err: SqlerError) -> Self {
        Self::with_binding(query, Binding::Failed(err))
    }

    fn check(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SqlerError::StmtClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl DriverStmt for PostgresStmt {
    fn query_text(&self) -> &str {
        &self.query
    }

    async fn exec(&self, ctx: &Context, args: &[SqlValue]) -> Result<ExecResult> {
        self.check()?;
        match &self.binding {
            Binding::Pool(shared) => {
                shared.lease(ctx).await?.exec_prepared(ctx, &self.query, args).await
            }
            Binding::Lease { lease, statement } => lease.exec_statement(ctx, statement, args).await,
            Binding::Failed(err) => Err(err.clone()),
        }
    }

    async fn query(&self, ctx: &Context, args: &[SqlValue]) -> Result<Box<dyn DriverRows>> {
        self.check()?;
        let rows = match &self.binding {
            Binding::Pool(shared) => {
                shared.lease(ctx).await?.query_prepared(ctx, &self.query, args).await?
            }
            Binding::Lease { lease, statement } => {
                lease.query_statement(ctx, statement, args).await?
            }
            Binding::Failed(err) => return Err(err.clone()),
        };
        Ok(Box::new(rows))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
