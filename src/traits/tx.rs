use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::traits::{Queryer, Stmt};

#[async_trait]
pub trait Tx: Queryer {
    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;

    /// Re-binds a prepared statement to this transaction.
    async fn stmt(&self, ctx: &Context, stmt: &dyn Stmt) -> Box<dyn Stmt>;
}
