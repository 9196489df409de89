//! Adapters that expose native driver objects through the capability traits.

mod conn;
mod db;
mod queryer;
mod rows;
mod stmt;
mod tx;

use std::sync::Arc;

pub use self::conn::WrappedConn;
pub use self::db::WrappedDb;
pub use self::queryer::WrappedQueryer;
pub use self::rows::{DeferredRow, WrappedRows};
pub use self::stmt::WrappedStmt;
pub use self::tx::{ConnTx, WrappedTx};

use crate::traits::{Conn, Db, DriverConn, DriverPool, DriverQueryer, DriverStmt, Queryer, Stmt};

pub fn wrap_db(pool: Arc<dyn DriverPool>) -> Box<dyn Db> {
    Box::new(WrappedDb::new(pool))
}

pub fn wrap_conn(conn: Arc<dyn DriverConn>) -> Box<dyn Conn> {
    Box::new(WrappedConn::new(conn))
}

pub fn wrap_queryer<Q>(queryer: Arc<Q>) -> Box<dyn Queryer>
where
    Q: DriverQueryer + ?Sized + 'static,
{
    Box::new(WrappedQueryer::new(queryer))
}

pub fn wrap_stmt(stmt: Arc<dyn DriverStmt>) -> Box<dyn Stmt> {
    Box::new(WrappedStmt::new(stmt))
}
