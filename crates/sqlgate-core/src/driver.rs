//! Remote driver contract.
//!
//! The actual MySQL client stays outside the engine: the core talks to the
//! target and backup servers exclusively through these traits, and every
//! server round-trip surfaces vendor codes via
//! [`DriverError`](sqlgate_commons::errors::DriverError) so callers can
//! tolerate the benign ones (1007, 1050, 1146) where appropriate.

use sqlgate_commons::errors::DriverError;
use sqlgate_commons::models::{BinlogPosition, ExplainRow, FieldInfo, IndexInfo};

pub type DriverResult<T> = Result<T, DriverError>;

/// Where to connect; taken from the batch options or the backup config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

/// One open connection to a MySQL-compatible server.
///
/// The typed accessors correspond to the statements the engine issues
/// (`SHOW FULL FIELDS`, `SHOW INDEX`, `SHOW MASTER STATUS`, `EXPLAIN`, ...);
/// `exec` and `query` cover DDL/DML execution and SHOW passthrough.
pub trait Connection {
    /// Execute a statement, returning affected rows.
    fn exec(&mut self, sql: &str) -> DriverResult<u64>;

    /// Run an arbitrary row-returning statement; columns plus rows of
    /// nullable values.
    fn query(&mut self, sql: &str) -> DriverResult<(Vec<String>, Vec<Vec<Option<String>>>)>;

    /// `SHOW FULL FIELDS FROM schema.table`; a missing table surfaces
    /// vendor code 1146.
    fn show_full_fields(&mut self, schema: &str, table: &str) -> DriverResult<Vec<FieldInfo>>;

    /// `SHOW INDEX FROM schema.table`, one row per indexed column.
    fn show_index(&mut self, schema: &str, table: &str) -> DriverResult<Vec<IndexInfo>>;

    /// `SHOW CREATE TABLE schema.table`.
    fn show_create_table(&mut self, schema: &str, table: &str) -> DriverResult<Option<String>>;

    /// `SHOW DATABASES LIKE 'name'`.
    fn show_databases_like(&mut self, name: &str) -> DriverResult<Option<String>>;

    /// `SHOW VARIABLES LIKE 'name'`, the value only.
    fn show_variable(&mut self, name: &str) -> DriverResult<Option<String>>;

    /// `SHOW MASTER STATUS`; None when binary logging is off.
    fn master_status(&mut self) -> DriverResult<Option<BinlogPosition>>;

    /// `EXPLAIN <sql>`.
    fn explain(&mut self, sql: &str) -> DriverResult<Vec<ExplainRow>>;

    /// Estimated row count from `information_schema.tables`.
    fn table_row_estimate(&mut self, schema: &str, table: &str) -> DriverResult<Option<u64>>;

    /// `select connection_id()`.
    fn connection_id(&mut self) -> DriverResult<u32>;
}

/// Opens connections; one implementation per actual client library.
pub trait Connector {
    type Conn: Connection;

    fn connect(&self, endpoint: &Endpoint) -> DriverResult<Self::Conn>;
}
