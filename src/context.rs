use std::future::{pending, Future};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{Result, SqlerError};

/// Execution context carried by every operation.
///
/// The adapters forward it untouched; native drivers honour it through
/// [`Context::run`].
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl Context {
    /// A context that is never canceled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a copy that expires `timeout` from now, or earlier if the
    /// existing deadline is sooner.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why this context is no longer usable, if it isn't.
    pub fn err(&self) -> Option<SqlerError> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Some(SqlerError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(SqlerError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Drives `fut` until it completes, the token fires or the deadline passes.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }

        let canceled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => {
                    tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await
                }
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            result = fut => result,
            _ = canceled => Err(SqlerError::Canceled),
            _ = expired => Err(SqlerError::DeadlineExceeded),
        }
    }
}
