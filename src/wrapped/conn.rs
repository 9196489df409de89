use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::traits::{Conn, DriverConn, Queryer, Row, Rows, Stmt, Tx};
use crate::types::{ExecResult, SqlValue, TxOptions};
use crate::wrapped::{ConnTx, WrappedQueryer, WrappedTx};

/// Adapter over a leased native connection.
///
/// Cloning shares the same connection; closing any clone closes it for all.
#[derive(Clone)]
pub struct WrappedConn {
    conn: Arc<dyn DriverConn>,
    queryer: WrappedQueryer<dyn DriverConn>,
}

impl WrappedConn {
    pub fn new(conn: Arc<dyn DriverConn>) -> Self {
        let queryer = WrappedQueryer::new(Arc::clone(&conn));
        Self { conn, queryer }
    }

    /// The wrapped native connection.
    pub fn native(&self) -> &Arc<dyn DriverConn> {
        &self.conn
    }
}

#[async_trait]
impl Queryer for WrappedConn {
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
impl Conn for WrappedConn {
    async fn close(&self) -> Result<()> {
        self.conn.close().await
    }

    /// The returned transaction owns this connection and closes it once it
    /// commits or rolls back.
    async fn begin_tx(&self, ctx: &Context, opts: &TxOptions) -> Result<Box<dyn Tx>> {
        let tx = self.conn.begin_tx(ctx, opts).await?;
        Ok(Box::new(ConnTx::new(self.clone(), WrappedTx::new(tx))))
    }

    async fn ping(&self, ctx: &Context) -> Result<()> {
        self.conn.ping(ctx).await
    }
}
