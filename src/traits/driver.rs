use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::types::{ColumnType, DbStats, ExecResult, SqlValue, TxOptions};

/// The native side of the adapters: what a database driver provides.
///
/// Implemented by the pool handle, a leased connection and a transaction.
/// Parameters use the driver's own placeholder syntax (`$1`, `$2`, ... for
/// Postgres).
#[async_trait]
pub trait DriverQueryer: Send + Sync {
    async fn exec(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Result<ExecResult>;

    async fn prepare(&self, ctx: &Context, query: &str) -> Result<Arc<dyn DriverStmt>>;

    async fn query(
        &self,
        ctx: &Context,
        query: &str,
        args: &[SqlValue],
    ) -> Result<Box<dyn DriverRows>>;
}

/// A single leased connection.
#[async_trait]
pub trait DriverConn: DriverQueryer {
    async fn begin_tx(&self, ctx: &Context, opts: &TxOptions) -> Result<Arc<dyn DriverTx>>;

    /// Releases the connection. A second call fails with `ConnDone`.
    async fn close(&self) -> Result<()>;

    async fn ping(&self, ctx: &Context) -> Result<()>;
}

/// A pool of connections to one data source.
#[async_trait]
pub trait DriverPool: DriverQueryer {
    /// Leases a dedicated connection from the pool.
    async fn conn(&self, ctx: &Context) -> Result<Arc<dyn DriverConn>>;

    /// Begins a transaction on a pooled connection that goes back to the pool
    /// once the transaction ends.
    async fn begin_tx(&self, ctx: &Context, opts: &TxOptions) -> Result<Arc<dyn DriverTx>>;

    /// Closes idle connections and refuses new leases.
    async fn close(&self) -> Result<()>;

    fn set_conn_max_lifetime(&self, lifetime: Option<Duration>);

    /// `0` keeps no idle connections.
    fn set_max_idle_conns(&self, n: usize);

    /// `0` lifts the limit to the driver's default. Lowers the idle limit
    /// when it exceeds `n`.
    fn set_max_open_conns(&self, n: usize);

    fn stats(&self) -> DbStats;
}

#[async_trait]
pub trait DriverTx: DriverQueryer {
    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;

    /// Returns a statement bound to this transaction. Never fails directly:
    /// a failed rebind is reported by the returned statement.
    async fn stmt(&self, ctx: &Context, stmt: &Arc<dyn DriverStmt>) -> Arc<dyn DriverStmt>;
}

#[async_trait]
pub trait DriverStmt: Send + Sync {
    /// The text the statement was prepared from.
    fn query_text(&self) -> &str;

    async fn exec(&self, ctx: &Context, args: &[SqlValue]) -> Result<ExecResult>;

    async fn query(&self, ctx: &Context, args: &[SqlValue]) -> Result<Box<dyn DriverRows>>;

    /// Idempotent.
    async fn close(&self) -> Result<()>;
}

/// A native row stream. One or more result sets, consumed front to back.
#[async_trait]
pub trait DriverRows: Send {
    /// Columns of the current result set.
    fn columns(&self) -> &[ColumnType];

    /// The next row of the current result set, `None` at its end.
    async fn next(&mut self) -> Result<Option<Vec<SqlValue>>>;

    fn has_next_result_set(&self) -> bool;

    /// Moves to the next result set; `false` when there is none.
    async fn next_result_set(&mut self) -> Result<bool>;

    async fn close(&mut self) -> Result<()>;
}
