mod conn;
mod driver;
mod queryer;
mod rows;
mod stmt;
mod tx;

pub use conn::{Conn, Db};
pub use driver::{DriverConn, DriverPool, DriverQueryer, DriverRows, DriverStmt, DriverTx};
pub use queryer::Queryer;
pub use rows::{Row, Rows};
pub use stmt::Stmt;
pub use tx::Tx;
