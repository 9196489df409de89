//! Native Postgres driver: `deadpool-postgres` for pooling, `tokio-postgres`
//! for the wire protocol.

mod conn;
mod lease;
mod pool;
mod rows;
mod stmt;
mod tx;
mod value;

pub use conn::PostgresConn;
pub use pool::PostgresPool;
pub use rows::PostgresRows;
pub use stmt::PostgresStmt;
pub use tx::PostgresTx;
