use std::time::Duration;

use crate::traits::Db;

/// Pool tuning applied to a [`Db`] after it is opened.
///
/// Unset fields leave the driver's defaults in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolSettings {
    pub max_open_conns: Option<usize>,
    pub max_idle_conns: Option<usize>,
    pub conn_max_lifetime: Option<Duration>,
}

impl PoolSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_open_conns(mut self, n: usize) -> Self {
        self.max_open_conns = Some(n);
        self
    }

    pub fn max_idle_conns(mut self, n: usize) -> Self {
        self.max_idle_conns = Some(n);
        self
    }

    pub fn conn_max_lifetime(mut self, lifetime: Duration) -> Self {
        self.conn_max_lifetime = Some(lifetime);
        self
    }

    /// Applies the open limit before the idle limit, since raising or
    /// lowering the former also clamps the latter.
    pub fn apply(&self, db: &dyn Db) {
        if let Some(n) = self.max_open_conns {
            db.set_max_open_conns(n);
        }
        if let Some(n) = self.max_idle_conns {
            db.set_max_idle_conns(n);
        }
        if self.conn_max_lifetime.is_some() {
            db.set_conn_max_lifetime(self.conn_max_lifetime);
        }
        tracing::debug!(settings = ?self, "pool settings applied");
    }
}
