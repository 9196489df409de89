use std::time::Duration;

/// Point-in-time pool counters. Fields are read independently and may not be
/// mutually consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DbStats {
    /// Maximum number of open connections, 0 for unlimited.
    pub max_open_connections: usize,
    /// Established connections, both in use and idle.
    pub open_connections: usize,
    pub in_use: usize,
    pub idle: usize,
    /// Total number of acquisitions that had to wait for a connection.
    pub wait_count: u64,
    /// Total time spent waiting for connections.
    pub wait_duration: Duration,
    /// Connections closed because of the idle limit.
    pub max_idle_closed: u64,
    /// Connections closed because they outlived the maximum lifetime.
    pub max_lifetime_closed: u64,
}
