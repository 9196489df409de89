use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::traits::{Conn, DriverTx, Queryer, Row, Rows, Stmt, Tx};
use crate::types::{ExecResult, SqlValue};
use crate::wrapped::{WrappedConn, WrappedQueryer, WrappedStmt};

/// Adapter over a native transaction.
pub struct WrappedTx {
    tx: Arc<dyn DriverTx>,
    queryer: WrappedQueryer<dyn DriverTx>,
}

impl WrappedTx {
    pub fn new(tx: Arc<dyn DriverTx>) -> Self {
        let queryer = WrappedQueryer::new(Arc::clone(&tx));
        Self { tx, queryer }
    }
}

#[async_trait]
impl Queryer for WrappedTx {
    async fn exec(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Result<ExecResult> {
        self.queryer.exec(ctx, query, args).await
    }

    async fn prepare(&self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>> {
        self.queryer.prepare(ctx, query).await
    }

    async fn query(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Result<Box<dyn Rows>> {
        self.queryer.query(ctx, query, args).await
    }

    async fn query_row(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Box<dyn Row> {
        self.queryer.query_row(ctx, query, args).await
    }
}

#[async_trait]
impl Tx for WrappedTx {
    async fn commit(&self) -> Result<()> {
        self.tx.commit().await
    }

    async fn rollback(&self) -> Result<()> {
        self.tx.rollback().await
    }

    async fn stmt(&self, ctx: &Context, stmt: &dyn Stmt) -> Box<dyn Stmt> {
        let rebound = self.tx.stmt(ctx, stmt.native()).await;
        Box::new(WrappedStmt::new(rebound))
    }
}

/// A transaction begun on an explicitly leased connection.
///
/// Owns that connection: `commit` and `rollback` close it whatever their own
/// outcome. The commit/rollback error takes precedence over the close error.
pub struct ConnTx {
    conn: WrappedConn,
    tx: WrappedTx,
}

impl ConnTx {
    pub fn new(conn: WrappedConn, tx: WrappedTx) -> Self {
        Self { conn, tx }
    }
}

#[async_trait]
impl Queryer for ConnTx {
    async fn exec(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Result<ExecResult> {
        self.tx.exec(ctx, query, args).await
    }

    async fn prepare(&self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>> {
        self.tx.prepare(ctx, query).await
    }

    async fn query(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Result<Box<dyn Rows>> {
        self.tx.query(ctx, query, args).await
    }

    async fn query_row(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Box<dyn Row> {
        self.tx.query_row(ctx, query, args).await
    }
}

#[async_trait]
impl Tx for ConnTx {
    async fn commit(&self) -> Result<()> {
        let committed = self.tx.commit().await;
        let closed = self.conn.close().await;
        tracing::debug!(
            committed = committed.is_ok(),
            closed = closed.is_ok(),
            "connection transaction committed"
        );
        committed.and(closed)
    }

    async fn rollback(&self) -> Result<()> {
        let rolled_back = self.tx.rollback().await;
        let closed = self.conn.close().await;
        tracing::debug!(
            rolled_back = rolled_back.is_ok(),
            closed = closed.is_ok(),
            "connection transaction rolled back"
        );
        rolled_back.and(closed)
    }

    async fn stmt(&self, ctx: &Context, stmt: &dyn Stmt) -> Box<dyn Stmt> {
        self.tx.stmt(ctx, stmt).await
    }
}
