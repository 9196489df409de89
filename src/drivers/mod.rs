mod postgres;

pub use self::in_memory_test::{
    InMemoryResponse, InMemoryTestDriver, InMemoryTestResponseBuilder, Operation, RecordedQuery,
    Target, TxOutcome,
};
pub use self::postgres::{PostgresConn, PostgresPool, PostgresRows, PostgresStmt, PostgresTx};
