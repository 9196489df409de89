use std::sync::Arc;

use sqler::drivers::{
    InMemoryResponse, InMemoryTestDriver, InMemoryTestResponseBuilder, Operation, Target,
    TxOutcome,
};
use sqler::error::SqlerError;
use sqler::traits::{DriverConn, DriverPool};
use sqler::types::SqlValue;
use sqler::{wrap_conn, wrap_db, wrap_stmt, Context, Db, Queryer, TxOptions};
use tokio_util::sync::CancellationToken;

fn setup(driver: InMemoryTestDriver) -> (Arc<InMemoryTestDriver>, Box<dyn Db>) {
    let driver = Arc::new(driver);
    let db = wrap_db(Arc::clone(&driver) as Arc<dyn DriverPool>);
    (driver, db)
}

fn users() -> InMemoryResponse {
    InMemoryTestResponseBuilder::new()
        .columns(&["id", "name"])
        .row(vec![SqlValue::Int64(1), "Alice".into()])
        .row(vec![SqlValue::Int64(2), "Bob".into()])
        .build()
}

fn last_tx_id(driver: &InMemoryTestDriver) -> usize {
    match driver.last_query().map(|q| q.target) {
        Some(Target::Tx(id)) => id,
        other => panic!("expected a statement inside a transaction, got {other:?}"),
    }
}

async fn count_users<Q: Queryer + ?Sized>(queryer: &Q, ctx: &Context) -> sqler::Result<i64> {
    let mut count = 0i64;
    queryer
        .query_row(ctx, "SELECT count(*) FROM users", &[])
        .await
        .scan(&mut [&mut count])
        .await?;
    Ok(count)
}

#[tokio::test]
async fn test_exec_returns_driver_result() {
    let (driver, db) = setup(InMemoryTestDriver::new().with_response(
        InMemoryTestResponseBuilder::new()
            .rows_affected(3)
            .last_insert_id(42)
            .build(),
    ));
    let ctx = Context::background();

    let result = db
        .exec(&ctx, "UPDATE users SET active = $1", &[true.into()])
        .await
        .unwrap();

    assert_eq!(result.rows_affected(), 3);
    assert_eq!(result.last_insert_id().unwrap(), 42);
    driver.assert_last_query("UPDATE users SET active = $1", &[SqlValue::Bool(true)]);
    assert_eq!(db.stats().in_use, 0);
}

#[tokio::test]
async fn test_exec_without_insert_id() {
    let (_driver, db) = setup(InMemoryTestDriver::new().with_response(
        InMemoryTestResponseBuilder::new().rows_affected(1).build(),
    ));
    let result = db
        .exec(&Context::background(), "DELETE FROM users WHERE id = $1", &[1i64.into()])
        .await
        .unwrap();
    assert!(matches!(
        result.last_insert_id(),
        Err(SqlerError::Unsupported("LastInsertId"))
    ));
}

#[tokio::test]
async fn test_exec_failure_is_passed_through() {
    let (_driver, db) = setup(
        InMemoryTestDriver::new().with_response(InMemoryResponse::error(SqlerError::driver(
            std::io::Error::new(std::io::ErrorKind::Other, "duplicate key"),
        ))),
    );
    let err = db
        .exec(&Context::background(), "INSERT INTO users VALUES ($1)", &[1i64.into()])
        .await
        .unwrap_err();
    let io = err.driver_error::<std::io::Error>().unwrap();
    assert_eq!(io.to_string(), "duplicate key");
}

#[tokio::test]
async fn test_query_row_reports_no_rows_on_scan() {
    let (driver, db) = setup(InMemoryTestDriver::new());
    let ctx = Context::background();

    let mut row = db
        .query_row(&ctx, "SELECT name FROM users WHERE id = $1", &[99i64.into()])
        .await;
    driver.assert_query_count(1);

    let mut name = String::new();
    let err = row.scan(&mut [&mut name]).await.unwrap_err();
    assert!(err.is_no_rows());
    assert!(name.is_empty());
    assert_eq!(driver.open_rows(), 0);
    assert_eq!(db.stats().in_use, 0);
}

#[tokio::test]
async fn test_query_row_scans_first_row() {
    let (driver, db) = setup(InMemoryTestDriver::new().with_response(users()));
    let mut id = 0i64;
    let mut name = String::new();
    db.query_row(&Context::background(), "SELECT id, name FROM users", &[])
        .await
        .scan(&mut [&mut id, &mut name])
        .await
        .unwrap();
    assert_eq!((id, name.as_str()), (1, "Alice"));
    assert_eq!(driver.open_rows(), 0);
}

#[tokio::test]
async fn test_query_row_failure_is_deferred_to_scan() {
    let (_driver, db) = setup(
        InMemoryTestDriver::new().with_response(InMemoryResponse::error(SqlerError::BadConn)),
    );
    let mut row = db
        .query_row(&Context::background(), "SELECT 1", &[])
        .await;

    let mut value = 0i64;
    for _ in 0..2 {
        let err = row.scan(&mut [&mut value]).await.unwrap_err();
        assert!(matches!(err, SqlerError::BadConn));
    }
    assert_eq!(value, 0);
}

#[tokio::test]
async fn test_rows_exhaustion_releases_the_connection() {
    let (driver, db) = setup(InMemoryTestDriver::new().with_response(users()));
    let ctx = Context::background();

    let mut rows = db.query(&ctx, "SELECT id, name FROM users", &[]).await.unwrap();
    assert_eq!(rows.columns().unwrap(), vec!["id", "name"]);
    assert_eq!(db.stats().in_use, 1);

    let mut names = Vec::new();
    while rows.next().await {
        let mut id = 0i64;
        let mut name = String::new();
        rows.scan(&mut [&mut id, &mut name]).unwrap();
        names.push(name);
    }

    assert_eq!(names, vec!["Alice", "Bob"]);
    assert!(rows.err().is_none());
    assert_eq!(driver.open_rows(), 0);
    assert_eq!(db.stats().in_use, 0);
    rows.close().await.unwrap();
}

#[tokio::test]
async fn test_rows_mid_stream_failure() {
    let (driver, db) = setup(
        InMemoryTestDriver::new().with_response(
            InMemoryTestResponseBuilder::new()
                .columns(&["id"])
                .row(vec![SqlValue::Int64(1)])
                .fail_after_rows(SqlerError::BadConn)
                .build(),
        ),
    );
    let mut rows = db
        .query(&Context::background(), "SELECT id FROM users", &[])
        .await
        .unwrap();

    assert!(rows.next().await);
    assert!(!rows.next().await);
    assert!(matches!(rows.err(), Some(SqlerError::BadConn)));
    assert_eq!(driver.open_rows(), 0);
    rows.close().await.unwrap();
}

#[tokio::test]
async fn test_multiple_result_sets() {
    let (_driver, db) = setup(
        InMemoryTestDriver::new().with_response(
            InMemoryTestResponseBuilder::new()
                .columns(&["id"])
                .row(vec![SqlValue::Int64(1)])
                .next_result_set()
                .columns(&["name"])
                .row(vec!["Alice".into()])
                .build(),
        ),
    );
    let mut rows = db
        .query(&Context::background(), "SELECT id FROM a; SELECT name FROM b", &[])
        .await
        .unwrap();

    assert!(rows.next().await);
    assert!(!rows.next().await);
    assert!(rows.next_result_set().await);
    assert_eq!(rows.columns().unwrap(), vec!["name"]);
    assert!(rows.next().await);
    let mut name = String::new();
    rows.scan(&mut [&mut name]).unwrap();
    assert_eq!(name, "Alice");
    assert!(!rows.next().await);
    assert!(!rows.next_result_set().await);
    assert!(rows.err().is_none());
}

#[tokio::test]
async fn test_conn_tx_commit_closes_connection() {
    let (driver, db) = setup(InMemoryTestDriver::new());
    let ctx = Context::background();

    let conn = db.conn(&ctx).await.unwrap();
    let tx = conn.begin_tx(&ctx, &TxOptions::default()).await.unwrap();
    tx.exec(&ctx, "UPDATE users SET active = true", &[]).await.unwrap();
    let tx_id = last_tx_id(&driver);
    let conn_id = driver.tx_conn(tx_id).unwrap();
    assert!(!driver.conn_closed(conn_id));

    tx.commit().await.unwrap();

    assert_eq!(driver.tx_outcome(tx_id), Some(TxOutcome::Committed));
    assert!(driver.conn_closed(conn_id));
    assert!(matches!(conn.ping(&ctx).await, Err(SqlerError::ConnDone)));
    assert!(matches!(
        conn.exec(&ctx, "SELECT 1", &[]).await,
        Err(SqlerError::ConnDone)
    ));
    assert_eq!(db.stats().in_use, 0);
}

#[tokio::test]
async fn test_conn_tx_commit_failure_still_closes_connection() {
    let (driver, db) = setup(InMemoryTestDriver::new());
    let ctx = Context::background();
    driver.fail_next(Operation::Commit, SqlerError::Pool("commit refused".to_string()));

    let conn = db.conn(&ctx).await.unwrap();
    let tx = conn.begin_tx(&ctx, &TxOptions::default()).await.unwrap();
    tx.exec(&ctx, "INSERT INTO audit DEFAULT VALUES", &[]).await.unwrap();
    let conn_id = driver.tx_conn(last_tx_id(&driver)).unwrap();

    let err = tx.commit().await.unwrap_err();
    assert!(matches!(err, SqlerError::Pool(msg) if msg == "commit refused"));
    assert!(driver.conn_closed(conn_id));
    assert!(matches!(conn.close().await, Err(SqlerError::ConnDone)));
}

#[tokio::test]
async fn test_conn_tx_commit_error_wins_over_close_error() {
    let (driver, db) = setup(InMemoryTestDriver::new());
    let ctx = Context::background();
    driver.fail_next(Operation::Commit, SqlerError::Pool("commit refused".to_string()));
    driver.fail_next(Operation::CloseConn, SqlerError::BadConn);

    let conn = db.conn(&ctx).await.unwrap();
    let tx = conn.begin_tx(&ctx, &TxOptions::default()).await.unwrap();

    let err = tx.commit().await.unwrap_err();
    assert!(matches!(err, SqlerError::Pool(_)));
    assert_eq!(driver.open_conns(), 0);
}

#[tokio::test]
async fn test_conn_tx_rollback_reports_close_error() {
    let (driver, db) = setup(InMemoryTestDriver::new());
    let ctx = Context::background();
    driver.fail_next(Operation::CloseConn, SqlerError::BadConn);

    let conn = db.conn(&ctx).await.unwrap();
    let tx = conn.begin_tx(&ctx, &TxOptions::default()).await.unwrap();
    tx.exec(&ctx, "DELETE FROM users", &[]).await.unwrap();
    let tx_id = last_tx_id(&driver);

    let err = tx.rollback().await.unwrap_err();
    assert!(matches!(err, SqlerError::BadConn));
    assert_eq!(driver.tx_outcome(tx_id), Some(TxOutcome::RolledBack));
    assert_eq!(driver.open_conns(), 0);
    assert!(matches!(conn.ping(&ctx).await, Err(SqlerError::ConnDone)));
}

#[tokio::test]
async fn test_pool_tx_leaves_no_leased_connection() {
    let (driver, db) = setup(InMemoryTestDriver::new());
    let ctx = Context::background();

    let tx = db.begin_tx(&ctx, &TxOptions::default()).await.unwrap();
    assert_eq!(db.stats().in_use, 1);
    tx.exec(&ctx, "UPDATE users SET active = false", &[]).await.unwrap();
    let tx_id = last_tx_id(&driver);

    tx.commit().await.unwrap();

    assert_eq!(driver.tx_conn(tx_id), None);
    assert_eq!(driver.tx_outcome(tx_id), Some(TxOutcome::Committed));
    assert_eq!(driver.open_conns(), 0);
    assert_eq!(db.stats().in_use, 0);
    assert!(matches!(tx.commit().await, Err(SqlerError::TxDone)));
    assert!(matches!(
        tx.exec(&ctx, "SELECT 1", &[]).await,
        Err(SqlerError::TxDone)
    ));
}

#[tokio::test]
async fn test_begin_failure_returns_connection() {
    let (driver, db) = setup(InMemoryTestDriver::new());
    driver.fail_next(Operation::BeginTx, SqlerError::BadConn);

    let err = db
        .begin_tx(&Context::background(), &TxOptions::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SqlerError::BadConn));
    assert_eq!(db.stats().in_use, 0);
}

#[tokio::test]
async fn test_same_code_runs_on_every_queryer() {
    let count = || {
        InMemoryTestResponseBuilder::new()
            .columns(&["count"])
            .row(vec![SqlValue::Int64(2)])
            .build()
    };
    let (driver, db) = setup(InMemoryTestDriver::new().with_responses([count(), count(), count()]));
    let ctx = Context::background();

    assert_eq!(count_users(db.as_ref(), &ctx).await.unwrap(), 2);
    assert_eq!(driver.last_query().unwrap().target, Target::Pool);

    let conn = db.conn(&ctx).await.unwrap();
    assert_eq!(count_users(conn.as_ref(), &ctx).await.unwrap(), 2);
    assert!(matches!(driver.last_query().unwrap().target, Target::Conn(_)));

    let tx = conn.begin_tx(&ctx, &TxOptions::default()).await.unwrap();
    assert_eq!(count_users(tx.as_ref(), &ctx).await.unwrap(), 2);
    assert!(matches!(driver.last_query().unwrap().target, Target::Tx(_)));
    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn test_native_handles_are_identical() {
    let driver = Arc::new(InMemoryTestDriver::new());
    let pool: Arc<dyn DriverPool> = driver.clone();
    let ctx = Context::background();

    let db = wrap_db(Arc::clone(&pool));
    assert!(Arc::ptr_eq(db.native(), &pool));

    let native = pool.prepare(&ctx, "SELECT 1").await.unwrap();
    let stmt = wrap_stmt(Arc::clone(&native));
    assert!(Arc::ptr_eq(stmt.native(), &native));
    assert_eq!(stmt.query_text(), "SELECT 1");
}

#[tokio::test]
async fn test_wrap_conn_couples_transactions() {
    let driver = Arc::new(InMemoryTestDriver::new());
    let ctx = Context::background();
    let native: Arc<dyn DriverConn> = driver.conn(&ctx).await.unwrap();

    let conn = wrap_conn(native);
    let tx = conn.begin_tx(&ctx, &TxOptions::default()).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(driver.open_conns(), 0);
}

#[tokio::test]
async fn test_close_twice_is_harmless() {
    let (driver, db) = setup(InMemoryTestDriver::new().with_response(users()));
    let ctx = Context::background();

    let stmt = db.prepare(&ctx, "SELECT id, name FROM users").await.unwrap();
    let mut rows = stmt.query(&ctx, &[]).await.unwrap();
    rows.close().await.unwrap();
    rows.close().await.unwrap();
    assert!(!rows.next().await);
    assert_eq!(driver.open_rows(), 0);

    stmt.close().await.unwrap();
    stmt.close().await.unwrap();
    assert_eq!(driver.open_stmts(), 0);
    assert!(matches!(
        stmt.exec(&ctx, &[]).await,
        Err(SqlerError::StmtClosed)
    ));
}

#[tokio::test]
async fn test_tx_stmt_runs_inside_the_transaction() {
    let (driver, db) = setup(InMemoryTestDriver::new());
    let ctx = Context::background();

    let stmt = db
        .prepare(&ctx, "INSERT INTO users (name) VALUES ($1)")
        .await
        .unwrap();
    let tx = db.begin_tx(&ctx, &TxOptions::default()).await.unwrap();
    let bound = tx.stmt(&ctx, stmt.as_ref()).await;
    assert_eq!(bound.query_text(), stmt.query_text());

    bound.exec(&ctx, &["Carol".into()]).await.unwrap();
    let tx_id = last_tx_id(&driver);
    driver.assert_last_query("INSERT INTO users (name) VALUES ($1)", &["Carol".into()]);

    tx.commit().await.unwrap();
    assert_eq!(driver.tx_outcome(tx_id), Some(TxOutcome::Committed));

    let late = tx.stmt(&ctx, stmt.as_ref()).await;
    assert!(matches!(
        late.exec(&ctx, &["Dave".into()]).await,
        Err(SqlerError::TxDone)
    ));
}

#[tokio::test]
async fn test_canceled_context_reaches_the_driver() {
    let (driver, db) = setup(InMemoryTestDriver::new().with_response(users()));
    let token = CancellationToken::new();
    let ctx = Context::background().with_cancel(token.clone());
    token.cancel();

    assert!(matches!(
        db.exec(&ctx, "DELETE FROM users", &[]).await,
        Err(SqlerError::Canceled)
    ));
    let mut id = 0i64;
    let err = db
        .query_row(&ctx, "SELECT id FROM users", &[])
        .await
        .scan(&mut [&mut id])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlerError::Canceled));
    driver.assert_query_count(0);
}

#[tokio::test]
async fn test_pool_limits_and_stats() {
    let (driver, db) = setup(InMemoryTestDriver::new());
    let ctx = Context::background();

    db.set_max_open_conns(2);
    db.set_max_idle_conns(5);
    let first = db.conn(&ctx).await.unwrap();
    let second = db.conn(&ctx).await.unwrap();

    let err = db.conn(&ctx).await.err().unwrap();
    assert!(matches!(err, SqlerError::Pool(_)));

    let stats = db.stats();
    assert_eq!(stats.max_open_connections, 2);
    assert_eq!(stats.in_use, 2);
    assert_eq!(stats.wait_count, 1);

    first.close().await.unwrap();
    second.close().await.unwrap();
    let stats = db.stats();
    assert_eq!((stats.in_use, stats.idle), (0, 2));

    db.set_max_idle_conns(0);
    let stats = db.stats();
    assert_eq!(stats.idle, 0);
    assert_eq!(stats.max_idle_closed, 2);
    assert_eq!(driver.open_conns(), 0);
}

#[tokio::test]
async fn test_db_ping_leases_and_returns_a_connection() {
    let (driver, db) = setup(InMemoryTestDriver::new());
    let ctx = Context::background();

    db.ping(&ctx).await.unwrap();
    assert_eq!(driver.open_conns(), 0);
    assert_eq!(db.stats().idle, 1);

    driver.fail_next(Operation::Ping, SqlerError::BadConn);
    assert!(matches!(db.ping(&ctx).await, Err(SqlerError::BadConn)));
    assert_eq!(driver.open_conns(), 0);
}

#[tokio::test]
async fn test_closed_db_refuses_work() {
    let (driver, db) = setup(InMemoryTestDriver::new());
    let ctx = Context::background();

    db.close().await.unwrap();
    assert!(driver.is_closed());
    assert!(matches!(
        db.exec(&ctx, "SELECT 1", &[]).await,
        Err(SqlerError::DatabaseClosed)
    ));
    assert!(matches!(db.conn(&ctx).await, Err(SqlerError::DatabaseClosed)));
}

#[tokio::test]
async fn test_wrap_queryer_over_native_connection() {
    let driver = Arc::new(InMemoryTestDriver::new().with_response(users()));
    let ctx = Context::background();
    let native: Arc<dyn DriverConn> = driver.conn(&ctx).await.unwrap();

    let queryer = sqler::wrap_queryer(Arc::clone(&native));
    let mut rows = queryer.query(&ctx, "SELECT id, name FROM users", &[]).await.unwrap();
    let mut seen = 0;
    while rows.next().await {
        seen += 1;
    }
    assert_eq!(seen, 2);
    assert!(matches!(driver.last_query().unwrap().target, Target::Conn(_)));
    native.close().await.unwrap();
}
