use std::sync::Arc;

use crate::config::PoolSettings;
use crate::drivers::PostgresPool;
use crate::error::{Result, SqlerError};
use crate::traits::Db;
use crate::wrapped::wrap_db;

/// Opens a database handle for a registered driver name.
///
/// Only the DSN is validated here; no connection is made until the first
/// operation needs one.
///
/// ```no_run
/// # async fn example() -> sqler::Result<()> {
/// use sqler::{open, Conn, Context};
///
/// let db = open("postgres", "postgres://postgres@localhost/app")?;
/// db.ping(&Context::background()).await?;
/// # Ok(())
/// # }
/// ```
pub fn open(driver_name: &str, dsn: &str) -> Result<Box<dyn Db>> {
    let db = match driver_name {
        "postgres" | "postgresql" => wrap_db(Arc::new(PostgresPool::open(dsn)?)),
        other => return Err(SqlerError::UnknownDriver(other.to_string())),
    };
    tracing::debug!(driver = driver_name, "database opened");
    Ok(db)
}

/// Like [`open`], then applies `settings` to the new handle.
pub fn open_with_settings(
    driver_name: &str,
    dsn: &str,
    settings: &PoolSettings,
) -> Result<Box<dyn Db>> {
    let db = open(driver_name, dsn)?;
    settings.apply(db.as_ref());
    Ok(db)
}
