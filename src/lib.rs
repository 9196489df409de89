//! sqler - capability traits over async SQL connection pools
//!
//! Code written against [`Queryer`], [`Db`], [`Conn`], [`Tx`], [`Stmt`],
//! [`Rows`] and [`Row`] does not care whether it runs on a pool, a leased
//! connection or a transaction, and can be tested against
//! [`drivers::InMemoryTestDriver`] instead of a live server.
//!
//! # Example
//! ```no_run
//! # async fn example() -> sqler::Result<()> {
//! use sqler::{Conn, Context, Db, Queryer, Row, SqlValue, Tx, TxOptions};
//!
//! let db = sqler::open("postgres", "postgres://postgres@localhost/app")?;
//! let ctx = Context::background();
//!
//! // Transactions begun on a leased connection close it when they end
//! let conn = db.conn(&ctx).await?;
//! let tx = conn.begin_tx(&ctx, &TxOptions::default()).await?;
//! tx.exec(&ctx, "UPDATE users SET active = $1", &[SqlValue::from(true)])
//!     .await?;
//! tx.commit().await?;
//!
//! let mut name = String::new();
//! db.query_row(&ctx, "SELECT name FROM users WHERE id = $1", &[1i64.into()])
//!     .await
//!     .scan(&mut [&mut name])
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod drivers;
pub mod error;
pub mod traits;
pub mod types;
pub mod wrapped;

mod client;

// Re-export main types for convenient access
pub use client::{open, open_with_settings};
pub use config::PoolSettings;
pub use context::Context;
pub use error::{Result, SqlerError};
pub use traits::{Conn, Db, Queryer, Row, Rows, Stmt, Tx};
pub use types::{
    ColumnType, DbStats, ExecResult, IsolationLevel, ScanDest, SqlValue, TxOptions,
};
pub use wrapped::{wrap_conn, wrap_db, wrap_queryer, wrap_stmt};
