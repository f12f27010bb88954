//! Shared mock driver for the integration tests.
//!
//! The mock records every call it receives, so tests can assert not just
//! outcomes but which round-trips the engine made (or avoided).
#![allow(dead_code)]

use sqlgate_commons::errors::{DriverError, ER_NO_SUCH_TABLE};
use sqlgate_commons::models::{BinlogPosition, ExplainRow, FieldInfo, IndexInfo};
use sqlgate_commons::AuditConfig;
use sqlgate_core::{Connection, Connector, DriverResult, Endpoint, Session};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

#[derive(Default)]
pub struct MockState {
    /// `schema.name` (lowercase) -> columns.
    pub tables: HashMap<String, Vec<FieldInfo>>,
    /// `schema.name` (lowercase) -> index rows.
    pub indexes: HashMap<String, Vec<IndexInfo>>,
    pub databases: Vec<String>,
    /// e.g. log_bin -> ON, binlog_format -> ROW.
    pub variables: HashMap<String, String>,
    /// Consumed one per SHOW MASTER STATUS.
    pub master_positions: VecDeque<BinlogPosition>,
    /// `schema.name` -> SHOW CREATE TABLE text.
    pub create_table_texts: HashMap<String, String>,
    /// `schema.name` -> information_schema row estimate.
    pub row_estimates: HashMap<String, u64>,
    pub explain_rows: Vec<ExplainRow>,
    /// Exact statements that must fail, with the error to return.
    pub exec_failures: HashMap<String, DriverError>,

    /// Every statement passed to exec, in order.
    pub exec_log: Vec<String>,
    /// Every driver call, as "method:detail".
    pub calls: Vec<String>,

    pub connection_id: u32,
}

impl MockState {
    pub fn call_count(&self, method: &str) -> usize {
        let prefix = format!("{}:", method);
        self.calls.iter().filter(|c| c.starts_with(&prefix)).count()
    }
}

fn key(schema: &str, table: &str) -> String {
    format!("{}.{}", schema.to_lowercase(), table.to_lowercase())
}

pub struct MockConnection {
    state: Rc<RefCell<MockState>>,
}

impl Connection for MockConnection {
    fn exec(&mut self, sql: &str) -> DriverResult<u64> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("exec:{}", sql));
        state.exec_log.push(sql.to_string());
        if let Some(err) = state.exec_failures.get(sql) {
            return Err(err.clone());
        }
        Ok(1)
    }

    fn query(&mut self, sql: &str) -> DriverResult<(Vec<String>, Vec<Vec<Option<String>>>)> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("query:{}", sql));
        Ok((Vec::new(), Vec::new()))
    }

    fn show_full_fields(&mut self, schema: &str, table: &str) -> DriverResult<Vec<FieldInfo>> {
        let mut state = self.state.borrow_mut();
        state
            .calls
            .push(format!("show_full_fields:{}", key(schema, table)));
        match state.tables.get(&key(schema, table)) {
            Some(fields) => Ok(fields.clone()),
            None => Err(DriverError::new(
                ER_NO_SUCH_TABLE,
                format!("Table '{}.{}' doesn't exist", schema, table),
            )),
        }
    }

    fn show_index(&mut self, schema: &str, table: &str) -> DriverResult<Vec<IndexInfo>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("show_index:{}", key(schema, table)));
        Ok(state.indexes.get(&key(schema, table)).cloned().unwrap_or_default())
    }

    fn show_create_table(&mut self, schema: &str, table: &str) -> DriverResult<Option<String>> {
        let mut state = self.state.borrow_mut();
        state
            .calls
            .push(format!("show_create_table:{}", key(schema, table)));
        Ok(state.create_table_texts.get(&key(schema, table)).cloned())
    }

    fn show_databases_like(&mut self, name: &str) -> DriverResult<Option<String>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("show_databases_like:{}", name));
        Ok(state
            .databases
            .iter()
            .find(|db| db.eq_ignore_ascii_case(name))
            .cloned())
    }

    fn show_variable(&mut self, name: &str) -> DriverResult<Option<String>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("show_variable:{}", name));
        Ok(state.variables.get(name).cloned())
    }

    fn master_status(&mut self) -> DriverResult<Option<BinlogPosition>> {
        let mut state = self.state.borrow_mut();
        state.calls.push("master_status:".to_string());
        Ok(state.master_positions.pop_front())
    }

    fn explain(&mut self, sql: &str) -> DriverResult<Vec<ExplainRow>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("explain:{}", sql));
        Ok(state.explain_rows.clone())
    }

    fn table_row_estimate(&mut self, schema: &str, table: &str) -> DriverResult<Option<u64>> {
        let mut state = self.state.borrow_mut();
        state
            .calls
            .push(format!("table_row_estimate:{}", key(schema, table)));
        Ok(state.row_estimates.get(&key(schema, table)).copied())
    }

    fn connection_id(&mut self) -> DriverResult<u32> {
        let mut state = self.state.borrow_mut();
        state.calls.push("connection_id:".to_string());
        Ok(state.connection_id)
    }
}

pub struct MockConnector {
    state: Rc<RefCell<MockState>>,
}

impl Connector for MockConnector {
    type Conn = MockConnection;

    fn connect(&self, endpoint: &Endpoint) -> DriverResult<Self::Conn> {
        self.state
            .borrow_mut()
            .calls
            .push(format!("connect:{}:{}", endpoint.host, endpoint.port));
        Ok(MockConnection {
            state: Rc::clone(&self.state),
        })
    }
}

// ---- fixture helpers ----

pub fn field(name: &str, field_type: &str, null: &str, key: &str) -> FieldInfo {
    FieldInfo {
        field: name.to_string(),
        field_type: field_type.to_string(),
        null: null.to_string(),
        key: key.to_string(),
        ..Default::default()
    }
}

pub fn field_with_default(
    name: &str,
    field_type: &str,
    null: &str,
    default_value: &str,
    comment: &str,
) -> FieldInfo {
    FieldInfo {
        field: name.to_string(),
        field_type: field_type.to_string(),
        null: null.to_string(),
        default_value: default_value.to_string(),
        comment: comment.to_string(),
        ..Default::default()
    }
}

pub fn index_row(table: &str, index_name: &str, seq: u32, column: &str, non_unique: bool) -> IndexInfo {
    IndexInfo {
        table: table.to_string(),
        non_unique,
        index_name: index_name.to_string(),
        seq_in_index: seq,
        column_name: column.to_string(),
    }
}

/// Begin marker with the standard connection options plus `extra` pairs
/// such as `--execute=true;`.
pub fn begin_marker(extra: &str) -> String {
    format!(
        "/*--user=admin;--password=secret;--host=127.0.0.1;--port=3306;{}*/\ninception_magic_start;\n",
        extra
    )
}

/// Complete batch: begin marker, body, commit marker.
pub fn batch(extra: &str, body: &str) -> String {
    format!("{}{}\ninception_magic_commit;", begin_marker(extra), body)
}

pub fn new_state() -> Rc<RefCell<MockState>> {
    let state = MockState {
        databases: vec!["test".to_string()],
        connection_id: 42,
        ..Default::default()
    };
    Rc::new(RefCell::new(state))
}

pub fn session_with(
    config: AuditConfig,
    state: &Rc<RefCell<MockState>>,
) -> Session<MockConnector> {
    Session::new(
        config,
        MockConnector {
            state: Rc::clone(state),
        },
    )
}

pub fn session(state: &Rc<RefCell<MockState>>) -> Session<MockConnector> {
    session_with(AuditConfig::default(), state)
}

/// Config with a complete backup endpoint.
pub fn backup_config() -> AuditConfig {
    AuditConfig {
        backup_host: "10.0.0.9".to_string(),
        backup_port: 3307,
        backup_user: "backup".to_string(),
        backup_password: "backup".to_string(),
        ..Default::default()
    }
}
