mod column;
mod options;
mod result;
mod row;
mod scan;
mod sql_value;
mod stats;

pub use column::ColumnType;
pub use options::{IsolationLevel, TxOptions};
pub use result::ExecResult;
pub use row::ResultSet;
pub use scan::ScanDest;
pub use sql_value::SqlValue;
pub use stats::DbStats;
