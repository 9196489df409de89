use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::traits::{DriverPool, Queryer, Tx};
use crate::types::{DbStats, TxOptions};

/// A connection capability bundle.
#[async_trait]
pub trait Conn: Queryer {
    /// Releases the connection. Closing twice fails with `ConnDone`.
    async fn close(&self) -> Result<()>;

    async fn begin_tx(&self, ctx: &Context, opts: &TxOptions) -> Result<Box<dyn Tx>>;

    async fn ping(&self, ctx: &Context) -> Result<()>;
}

/// A database handle: a pool seen as one connection, plus pool controls.
#[async_trait]
pub trait Db: Conn {
    /// Leases a dedicated connection. Transactions begun on it own it.
    async fn conn(&self, ctx: &Context) -> Result<Box<dyn Conn>>;

    fn set_conn_max_lifetime(&self, lifetime: Option<Duration>);

    fn set_max_idle_conns(&self, n: usize);

    fn set_max_open_conns(&self, n: usize);

    fn stats(&self) -> DbStats;

    /// The wrapped native handle.
    fn native(&self) -> &Arc<dyn DriverPool>;
}
