use std::cell::Cell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use deadpool_postgres::{Manager, Pool};
use tokio_postgres::NoTls;

use super::conn::PostgresConn;
use super::lease::Lease;
use super::stmt::PostgresStmt;
use super::tx::PostgresTx;
use crate::context::Context;
use crate::error::{Result, SqlerError};
use crate::traits::{DriverConn, DriverPool, DriverQueryer, DriverRows, DriverStmt, DriverTx};
use crate::types::{DbStats, ExecResult, SqlValue, TxOptions};

/// Pool state shared by every lease handed out.
pub(super) struct PoolShared {
    pool: Pool,
    default_max_size: usize,
    max_lifetime: Mutex<Option<Duration>>,
    /// `usize::MAX` when unlimited.
    max_idle: AtomicUsize,
    wait_count: AtomicU64,
    wait_nanos: AtomicU64,
    max_idle_closed: AtomicU64,
    max_lifetime_closed: AtomicU64,
}

impl PoolShared {
    pub(super) async fn lease(self: &Arc<Self>, ctx: &Context) -> Result<Arc<Lease>> {
        self.sweep();
        let status = self.pool.status();
        let waits = status.available == 0 && status.size >= status.max_size;
        let started = Instant::now();

        let object = ctx
            .run(async { self.pool.get().await.map_err(SqlerError::from) })
            .await?;

        if waits {
            let waited = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
            self.wait_count.fetch_add(1, Ordering::Relaxed);
            self.wait_nanos.fetch_add(waited, Ordering::Relaxed);
        }
        tracing::trace!(waited = waits, "connection leased");
        Ok(Lease::new(object, Arc::clone(self)))
    }

    /// Drops idle clients past the lifetime or above the idle limit.
    pub(super) fn sweep(&self) {
        let lifetime = *self
            .max_lifetime
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let max_idle = self.max_idle.load(Ordering::Relaxed);
        let kept = Cell::new(0usize);
        let expired = Cell::new(0u64);
        let trimmed = Cell::new(0u64);

        let swept = self.pool.retain(|_, metrics| {
            if lifetime.is_some_and(|lifetime| metrics.age() >= lifetime) {
                expired.set(expired.get() + 1);
                return false;
            }
            if kept.get() >= max_idle {
                trimmed.set(trimmed.get() + 1);
                return false;
            }
            kept.set(kept.get() + 1);
            true
        });

        if !swept.removed.is_empty() {
            tracing::debug!(
                closed = swept.removed.len(),
                retained = swept.retained,
                expired = expired.get(),
                trimmed = trimmed.get(),
                "closed idle connections"
            );
        }
        self.max_lifetime_closed
            .fetch_add(expired.get(), Ordering::Relaxed);
        self.max_idle_closed.fetch_add(trimmed.get(), Ordering::Relaxed);
        // Removed clients disconnect as they drop.
        drop(swept);
    }
}

/// Postgres connection pool built on `deadpool-postgres`.
///
/// ```no_run
/// # async fn example() -> sqler::Result<()> {
/// use std::sync::Arc;
/// use sqler::drivers::PostgresPool;
/// use sqler::{wrap_db, Context, Queryer};
///
/// let pool = PostgresPool::open("host=localhost user=postgres dbname=app")?;
/// let db = wrap_db(Arc::new(pool));
/// db.exec(&Context::background(), "DELETE FROM sessions", &[]).await?;
/// # Ok(())
/// # }
/// ```
pub struct PostgresPool {
    shared: Arc<PoolShared>,
}

impl PostgresPool {
    /// Parses `dsn` (key/value or URL form) and builds a lazy pool. No
    /// connection is made until the first operation.
    pub fn open(dsn: &str) -> Result<Self> {
        let config: tokio_postgres::Config = dsn
            .parse()
            .map_err(|e: tokio_postgres::Error| SqlerError::ConnectionFailed(e.to_string()))?;
        let manager = Manager::new(config, NoTls);
        let pool = Pool::builder(manager)
            .build()
            .map_err(|e| SqlerError::ConnectionFailed(e.to_string()))?;
        Ok(Self::from_pool(pool))
    }

    /// Wraps an already configured pool.
    pub fn from_pool(pool: Pool) -> Self {
        let default_max_size = pool.status().max_size;
        tracing::debug!(max_size = default_max_size, "postgres pool ready");
        Self {
            shared: Arc::new(PoolShared {
                pool,
                default_max_size,
                max_lifetime: Mutex::new(None),
                max_idle: AtomicUsize::new(usize::MAX),
                wait_count: AtomicU64::new(0),
                wait_nanos: AtomicU64::new(0),
                max_idle_closed: AtomicU64::new(0),
                max_lifetime_closed: AtomicU64::new(0),
            }),
        }
    }
}

#[async_trait]
impl DriverQueryer for PostgresPool {
    async fn exec(&self, ctx: &Context, query: &str, args: &[SqlValue]) -> Result<ExecResult> {
        self.shared.lease(ctx).await?.exec(ctx, query, args).await
    }

    async fn prepare(&self, ctx: &Context, query: &str) -> Result<Arc<dyn DriverStmt>> {
        self.shared.lease(ctx).await?.prepare(ctx, query, true).await?;
        Ok(Arc::new(PostgresStmt::on_pool(
            Arc::clone(&self.shared),
            query,
        )))
    }

    async fn query(
        &self,
        ctx: &Context,
        query: &str,
        args: &[SqlValue],
    ) -> Result<Box<dyn DriverRows>> {
        let lease = self.shared.lease(ctx).await?;
        Ok(Box::new(lease.query(ctx, query, args).await?))
    }
}

#[async_trait]
impl DriverPool for PostgresPool {
    async fn conn(&self, ctx: &Context) -> Result<Arc<dyn DriverConn>> {
        let lease = self.shared.lease(ctx).await?;
        Ok(Arc::new(PostgresConn::new(lease)))
    }

    async fn begin_tx(&self, ctx: &Context, opts: &TxOptions) -> Result<Arc<dyn DriverTx>> {
        let lease = self.shared.lease(ctx).await?;
        lease.begin(ctx, opts).await?;
        Ok(Arc::new(PostgresTx::new(lease, true)))
    }

    async fn close(&self) -> Result<()> {
        self.shared.pool.close();
        tracing::debug!("postgres pool closed");
        Ok(())
    }

    fn set_conn_max_lifetime(&self, lifetime: Option<Duration>) {
        *self
            .shared
            .max_lifetime
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = lifetime;
        self.shared.sweep();
    }

    fn set_max_idle_conns(&self, n: usize) {
        self.shared.max_idle.store(n, Ordering::Relaxed);
        self.shared.sweep();
    }

    fn set_max_open_conns(&self, n: usize) {
        let max_size = if n == 0 {
            self.shared.default_max_size
        } else {
            n
        };
        self.shared.pool.resize(max_size);
        if n > 0 {
            self.shared.max_idle.fetch_min(n, Ordering::Relaxed);
        }
        self.shared.sweep();
    }

    fn stats(&self) -> DbStats {
        let status = self.shared.pool.status();
        DbStats {
            max_open_connections: status.max_size,
            open_connections: status.size,
            in_use: status.size.saturating_sub(status.available),
            idle: status.available,
            wait_count: self.shared.wait_count.load(Ordering::Relaxed),
            wait_duration: Duration::from_nanos(self.shared.wait_nanos.load(Ordering::Relaxed)),
            max_idle_closed: self.shared.max_idle_closed.load(Ordering::Relaxed),
            max_lifetime_closed: self.shared.max_lifetime_closed.load(Ordering::Relaxed),
        }
    }
}
