use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::traits::{Conn, Db, DriverPool, Queryer, Row, Rows, Stmt, Tx};
use crate::types::{DbStats, ExecResult, SqlValue, TxOptions};
use crate::wrapped::{WrappedConn, WrappedQueryer, WrappedTx};

/// Adapter over a native connection pool.
pub struct WrappedDb {
    pool: Arc<dyn DriverPool>,
    queryer: WrappedQueryer<dyn DriverPool>,
}

impl WrappedDb {
    pub fn new(pool: Arc<dyn DriverPool>) -> Self {
        let queryer = WrappedQueryer::new(Arc::clone(&pool));
        Self { pool, queryer }
    }
}

#[async_trait]
impl Queryer for WrappedDb {
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
impl Conn for WrappedDb {
    async fn close(&self) -> Result<()> {
        self.pool.close().await
    }

    /// Begins on the pool itself; the pool takes the connection back when
    /// the transaction ends.
    async fn begin_tx(&self, ctx: &Context, opts: &TxOptions) -> Result<Box<dyn Tx>> {
        let tx = self.pool.begin_tx(ctx, opts).await?;
        Ok(Box::new(WrappedTx::new(tx)))
    }

    /// Leases a dedicated connection, pings it and closes it again.
    async fn ping(&self, ctx: &Context) -> Result<()> {
        let conn = self.conn(ctx).await?;
        let pinged = conn.ping(ctx).await;
        let closed = conn.close().await;
        pinged.and(closed)
    }
}

#[async_trait]
impl Db for WrappedDb {
    async fn conn(&self, ctx: &Context) -> Result<Box<dyn Conn>> {
        let conn = self.pool.conn(ctx).await?;
        Ok(Box::new(WrappedConn::new(conn)))
    }

    fn set_conn_max_lifetime(&self, lifetime: Option<Duration>) {
        self.pool.set_conn_max_lifetime(lifetime);
    }

    fn set_max_idle_conns(&self, n: usize) {
        self.pool.set_max_idle_conns(n);
    }

    fn set_max_open_conns(&self, n: usize) {
        self.pool.set_max_open_conns(n);
    }

    fn stats(&self) -> DbStats {
        self.pool.stats()
    }

    fn native(&self) -> &Arc<dyn DriverPool> {
        &self.pool
    }
}
