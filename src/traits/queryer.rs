use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::traits::{Row, Rows, Stmt};
use crate::types::{ExecResult, SqlValue};

/// The minimal contract for running a parameterized statement.
///
/// Shared by [`Db`](crate::Db), [`Conn`](crate::Conn) and [`Tx`](crate::Tx).
#[async_trait]
pub trait Queryer: Send + Sync {
    /// Runs a statement that produces no row set.
    async fn exec(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Result<ExecResult>;

    /// Compiles `query` once for repeated execution.
    async fn prepare(&self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>>;

    /// Runs a statement that produces rows.
    async fn query(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Result<Box<dyn Rows>>;

    /// Runs a statement expected to produce at most one row. Never fails here:
    /// errors, including "no rows", are reported by [`Row::scan`].
    async fn query_row(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Box<dyn Row>;
}
