use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use deadpool_postgres::Object;
use tokio::sync::RwLock;
use tokio_postgres::{CancelToken, NoTls, SimpleQueryMessage, Statement};

use super::pool::PoolShared;
use super::rows::{result_sets, PostgresRows};
use super::value::params;
use crate::context::Context;
use crate::error::{Result, SqlerError};
use crate::types::{ExecResult, SqlValue, TxOptions};

/// One pooled client, shared by a connection, its transactions, statements
/// and open row streams.
///
/// A lease that is released while broken or inside a transaction is detached
/// from the pool instead of being handed back.
pub(super) struct Lease {
    object: RwLock<Option<Object>>,
    cancel: CancelToken,
    broken: AtomicBool,
    in_tx: AtomicBool,
    shared: Arc<PoolShared>,
}

impl Lease {
    pub(super) fn new(object: Object, shared: Arc<PoolShared>) -> Arc<Self> {
        let cancel = object.cancel_token();
        Arc::new(Self {
            object: RwLock::new(Some(object)),
            cancel,
            broken: AtomicBool::new(false),
            in_tx: AtomicBool::new(false),
            shared,
        })
    }

    fn usable<'a>(&self, object: &'a Option<Object>) -> Result<&'a Object> {
        let object = object.as_ref().ok_or(SqlerError::ConnDone)?;
        if self.broken.load(Ordering::Acquire) || object.is_closed() {
            return Err(SqlerError::BadConn);
        }
        Ok(object)
    }

    pub(super) fn mark_broken(&self) {
        self.broken.store(true, Ordering::Release);
    }

    /// Runs `fut` under `ctx`. If the context fires while the server is still
    /// working, the running statement is canceled server side and the client
    /// is never used again: a transaction on it can no longer commit.
    pub(super) async fn guard<T, F>(&self, ctx: &Context, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Some(err) = ctx.err() {
            return Err(err);
        }
        let result = ctx.run(fut).await;
        if matches!(
            result,
            Err(SqlerError::Canceled | SqlerError::DeadlineExceeded)
        ) {
            self.interrupt();
        }
        result
    }

    fn interrupt(&self) {
        self.mark_broken();
        tracing::debug!("statement interrupted; canceling it on the server");
        let cancel = self.cancel.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(err) = cancel.cancel_query(NoTls).await {
                    tracing::debug!(error = %err, "failed to send cancel request");
                }
            });
        }
    }

    /// Statements without parameters go through the simple query protocol,
    /// so scripts of several statements are accepted.
    pub(super) async fn exec(
        &self,
        ctx: &Context,
        query: &str,
        args: &[SqlValue],
    ) -> Result<ExecResult> {
        if !args.is_empty() {
            return self.exec_prepared(ctx, query, args).await;
        }
        let affected = self
            .simple(ctx, query)
            .await?
            .iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::CommandComplete(n) => Some(*n),
                _ => None,
            })
            .last()
            .unwrap_or(0);
        Ok(ExecResult::new(affected))
    }

    pub(super) async fn exec_prepared(
        &self,
        ctx: &Context,
        query: &str,
        args: &[SqlValue],
    ) -> Result<ExecResult> {
        let guard = self.object.read().await;
        let client = self.usable(&guard)?;
        self.guard(ctx, async {
            let statement = client.prepare_cached(query).await?;
            let affected = client.execute_raw(&statement, params(args)).await?;
            Ok::<_, SqlerError>(ExecResult::new(affected))
        })
        .await
    }

    pub(super) async fn exec_statement(
        &self,
        ctx: &Context,
        statement: &Statement,
        args: &[SqlValue],
    ) -> Result<ExecResult> {
        let guard = self.object.read().await;
        let client = self.usable(&guard)?;
        self.guard(ctx, async {
            let affected = client.execute_raw(statement, params(args)).await?;
            Ok::<_, SqlerError>(ExecResult::new(affected))
        })
        .await
    }

    pub(super) async fn query(
        self: &Arc<Self>,
        ctx: &Context,
        query: &str,
        args: &[SqlValue],
    ) -> Result<PostgresRows> {
        if !args.is_empty() {
            return self.query_prepared(ctx, query, args).await;
        }
        let messages = self.simple(ctx, query).await?;
        Ok(PostgresRows::buffered(result_sets(messages)))
    }

    pub(super) async fn query_prepared(
        self: &Arc<Self>,
        ctx: &Context,
        query: &str,
        args: &[SqlValue],
    ) -> Result<PostgresRows> {
        let statement = self.prepare(ctx, query, true).await?;
        self.query_statement(ctx, &statement, args).await
    }

    pub(super) async fn query_statement(
        self: &Arc<Self>,
        ctx: &Context,
        statement: &Statement,
        args: &[SqlValue],
    ) -> Result<PostgresRows> {
        let guard = self.object.read().await;
        let client = self.usable(&guard)?;
        let stream = self
            .guard(ctx, async {
                let stream = client.query_raw(statement, params(args)).await?;
                Ok::<_, SqlerError>(stream)
            })
            .await?;
        Ok(PostgresRows::streamed(
            ctx.clone(),
            statement,
            stream,
            Arc::clone(self),
        ))
    }

    async fn simple(&self, ctx: &Context, query: &str) -> Result<Vec<SimpleQueryMessage>> {
        let guard = self.object.read().await;
        let client = self.usable(&guard)?;
        self.guard(ctx, async {
            let messages = client.simple_query(query).await?;
            Ok::<_, SqlerError>(messages)
        })
        .await
    }

    /// Prepares `query` on this client. Cached statements are shared with
    /// every later user of the same pooled client.
    pub(super) async fn prepare(
        &self,
        ctx: &Context,
        query: &str,
        cached: bool,
    ) -> Result<Statement> {
        let guard = self.object.read().await;
        let client = self.usable(&guard)?;
        self.guard(ctx, async {
            let statement = if cached {
                client.prepare_cached(query).await?
            } else {
                client.prepare(query).await?
            };
            Ok::<_, SqlerError>(statement)
        })
        .await
    }

    pub(super) async fn batch(&self, ctx: &Context, sql: &str) -> Result<()> {
        let guard = self.object.read().await;
        let client = self.usable(&guard)?;
        self.guard(ctx, async {
            client.batch_execute(sql).await?;
            Ok::<_, SqlerError>(())
        })
        .await
    }

    pub(super) async fn ping(&self, ctx: &Context) -> Result<()> {
        self.batch(ctx, "SELECT 1").await
    }

    pub(super) async fn begin(&self, ctx: &Context, opts: &TxOptions) -> Result<()> {
        self.batch(ctx, &begin_statement(opts)).await?;
        self.in_tx.store(true, Ordering::Release);
        tracing::trace!(isolation = ?opts.isolation, read_only = opts.read_only, "transaction started");
        Ok(())
    }

    /// Ends the transaction with `sql`. A failure leaves the client in an
    /// unknown state, so it is not reused.
    pub(super) async fn finish(&self, sql: &str) -> Result<()> {
        let result = self.batch(&Context::background(), sql).await;
        match &result {
            Ok(()) => self.in_tx.store(false, Ordering::Release),
            Err(err) => {
                tracing::debug!(error = %err, sql, "failed to end transaction");
                self.mark_broken();
            }
        }
        result
    }

    /// Gives the client back. A second call fails with `ConnDone`.
    pub(super) async fn release(&self) -> Result<()> {
        let object = self.object.write().await.take().ok_or(SqlerError::ConnDone)?;
        self.hand_back(object);
        Ok(())
    }

    fn hand_back(&self, object: Object) {
        if self.broken.load(Ordering::Acquire) || self.in_tx.load(Ordering::Acquire) {
            tracing::debug!("discarding connection left in an unknown state");
            drop(Object::take(object));
        } else {
            drop(object);
        }
        self.shared.sweep();
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(object) = self.object.get_mut().take() {
            self.hand_back(object);
        }
    }
}

pub(super) fn begin_statement(opts: &TxOptions) -> String {
    let mut sql = String::from("BEGIN");
    if let Some(level) = opts.isolation.as_sql() {
        sql.push_str(" ISOLATION LEVEL ");
        sql.push_str(level);
    }
    if opts.read_only {
        sql.push_str(" READ ONLY");
    }
    sql
}
