use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::traits::{DriverStmt, Row, Rows};
use crate::types::{ExecResult, SqlValue};

/// A prepared statement. The query text is fixed at prepare time.
#[async_trait]
pub trait Stmt: Send + Sync {
    async fn exec(&self, ctx: &Context, args: &[SqlValue]) -> Result<ExecResult>;

    async fn query(&self, ctx: &Context, args: &[SqlValue]) -> Result<Box<dyn Rows>>;

    async fn query_row(&self, ctx: &Context, args: &[SqlValue]) -> Box<dyn Row>;

    async fn close(&self) -> Result<()>;

    fn query_text(&self) -> &str;

    /// The wrapped native statement.
    fn native(&self) -> &Arc<dyn DriverStmt>;
}
