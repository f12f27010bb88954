//! Batch session: state machine and shared helpers.
//!
//! One `Session` per client batch. The `run` loop interprets the wrapper
//! protocol (begin marker / body / commit marker), drives every statement
//! through CHECK, and hands over to the executor on commit. Review findings
//! are appended to the statement currently being checked, or — during the
//! commit phases — to the record the phase is visiting.

use crate::catalog::Catalog;
use crate::driver::{Connection, Connector, Endpoint};
use sqlgate_commons::constants::{SET_AUTOCOMMIT_QUERY, VERSION_COMMENT_QUERY};
use sqlgate_commons::errors::{CheckCode, ER_NO_SUCH_TABLE};
use sqlgate_commons::models::{
    BinlogPosition, FieldInfo, Record, ResultRow, StatementKind, TableId, TableInfo,
};
use sqlgate_commons::{AuditConfig, RecordStream};
use sqlgate_sql::ast::{Statement, TableRef};
use sqlgate_sql::options::SourceOptions;
use sqlgate_sql::{parse_statement, split_statements};
use std::collections::HashSet;

/// What a batch produces: per-statement result rows, or — for the
/// inception-scoped SHOW — variable name/value pairs.
#[derive(Debug)]
pub enum BatchOutput {
    Records(Vec<ResultRow>),
    Variables(Vec<(String, String)>),
}

/// Where findings are routed: the record being checked, or an already
/// appended record during EXECUTE/BACKUP.
pub(crate) enum ErrorSink {
    Current,
    Appended(usize),
}

pub struct Session<C: Connector> {
    pub(crate) config: AuditConfig,
    connector: C,

    pub(crate) opt: SourceOptions,
    pub(crate) db: Option<C::Conn>,
    pub(crate) backup_db: Option<C::Conn>,

    pub(crate) catalog: Catalog,
    pub(crate) records: RecordStream,
    pub(crate) current: Record,
    pub(crate) sink: ErrorSink,

    have_begin: bool,
    have_commit: bool,

    /// Session default schema, set by USE.
    pub(crate) db_name: String,

    pub(crate) backup_db_cache: HashSet<String>,
    pub(crate) backup_table_cache: HashSet<String>,
}

impl<C: Connector> Session<C> {
    pub fn new(config: AuditConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            opt: SourceOptions::default(),
            db: None,
            backup_db: None,
            catalog: Catalog::new(),
            records: RecordStream::new(),
            current: Record::new(0, "", StatementKind::Unsupported),
            sink: ErrorSink::Current,
            have_begin: false,
            have_commit: false,
            db_name: String::new(),
            backup_db_cache: HashSet::new(),
            backup_table_cache: HashSet::new(),
        }
    }

    /// The full record stream, for callers that need more than the result
    /// rows (rollback text, binlog windows).
    pub fn records(&self) -> &RecordStream {
        &self.records
    }

    /// Process one client batch.
    pub fn run(&mut self, input: &str) -> BatchOutput {
        let trimmed = input.trim();
        if !self.have_begin
            && (trimmed == VERSION_COMMENT_QUERY || trimmed == SET_AUTOCOMMIT_QUERY)
        {
            return BatchOutput::Records(Vec::new());
        }

        let statements = match split_statements(input) {
            Ok(statements) => statements,
            Err(err) => {
                let mut record =
                    Record::new(self.records.len(), input, StatementKind::Unsupported);
                record.append_error(2, &err.to_string());
                self.records.append(record);
                return BatchOutput::Records(self.records.rows());
            }
        };

        for text in statements {
            let parsed = match parse_statement(&text) {
                Ok(parsed) => parsed,
                Err(err) => {
                    log::warn!("parse error: {} in {}", err.message, text);
                    let mut record =
                        Record::new(self.records.len(), &text, StatementKind::Unsupported);
                    record.append_error(2, &err.message);
                    self.records.append(record);
                    return BatchOutput::Records(self.records.rows());
                }
            };

            self.current = Record::new(self.records.len(), &text, parsed.kind());
            self.sink = ErrorSink::Current;

            match parsed {
                Statement::InceptionStart => {
                    self.have_begin = true;
                    self.init_batch(&text);

                    let mut record = self.take_current();
                    if record.err_level == 2 {
                        record.sql = String::new();
                        self.records.append(record);
                        return BatchOutput::Records(self.records.rows());
                    }
                    self.records.append(record);
                    continue;
                }
                Statement::InceptionCommit => {
                    if !self.have_begin {
                        self.append_error_message("Must start as begin statement.");
                        let record = self.take_current();
                        self.records.append(record);
                        return BatchOutput::Records(self.records.rows());
                    }

                    self.have_commit = true;
                    self.execute_commit();
                    return BatchOutput::Records(self.records.rows());
                }
                Statement::InceptionShowVariables => {
                    return BatchOutput::Variables(self.config.variables());
                }
                statement => {
                    if !self.have_begin && statement.needs_data_source() {
                        self.append_error_message("Must start as begin statement.");
                        let record = self.take_current();
                        self.records.append(record);
                        break;
                    }

                    self.check_statement(statement, &text);
                    let record = self.take_current();
                    self.records.append(record);
                }
            }
        }

        if !self.have_commit {
            let mut record = Record::new(self.records.len(), "", StatementKind::Unsupported);
            record.append_error(2, "Must end with commit.");
            self.records.append(record);
        }

        BatchOutput::Records(self.records.rows())
    }

    /// Read options off the begin statement and open the connections.
    fn init_batch(&mut self, text: &str) {
        match SourceOptions::parse(text) {
            Ok(opt) => self.opt = opt,
            Err(_) => {
                self.append_error_no(CheckCode::SqlInvalidSource, &[]);
                return;
            }
        }

        let endpoint = Endpoint {
            host: self.opt.host.clone(),
            port: self.opt.port,
            user: self.opt.user.clone(),
            password: self.opt.password.clone(),
        };
        match self.connector.connect(&endpoint) {
            Ok(conn) => self.db = Some(conn),
            Err(err) => {
                log::error!("target connect failed: {}", err);
                self.append_error_message(&err.message);
                return;
            }
        }

        if self.opt.execute && self.opt.backup && !self.check_binlog_is_on() {
            self.append_error_message("binlog not enabled, cannot backup!");
        }

        if self.opt.backup {
            if !self.config.backup_endpoint_complete() {
                self.append_error_no(CheckCode::InvalidBackupHostInfo, &[]);
            } else {
                let endpoint = Endpoint {
                    host: self.config.backup_host.clone(),
                    port: self.config.backup_port,
                    user: self.config.backup_user.clone(),
                    password: self.config.backup_password.clone(),
                };
                match self.connector.connect(&endpoint) {
                    Ok(conn) => self.backup_db = Some(conn),
                    Err(err) => {
                        log::error!("backup connect failed: {}", err);
                        self.append_error_message(&err.message);
                    }
                }
            }
        }
    }

    pub(crate) fn take_current(&mut self) -> Record {
        std::mem::replace(
            &mut self.current,
            Record::new(0, "", StatementKind::Unsupported),
        )
    }

    // ---- finding sinks ----

    pub(crate) fn append_error_message(&mut self, msg: &str) {
        self.records.raise_level(2);
        match self.sink {
            ErrorSink::Current => self.current.append_error(2, msg),
            ErrorSink::Appended(idx) => {
                if let Some(record) = self.records.get_mut(idx) {
                    record.append_error(2, msg);
                }
            }
        }
    }

    pub(crate) fn append_error_no(&mut self, code: CheckCode, args: &[&str]) {
        let level = self.config.severity_for(code);
        let msg = code.format(args);
        self.records.raise_level(level);
        match self.sink {
            ErrorSink::Current => self.current.append_error(level, &msg),
            ErrorSink::Appended(idx) => {
                if let Some(record) = self.records.get_mut(idx) {
                    record.append_error(level, &msg);
                }
            }
        }
    }

    /// Severity of the record findings are currently routed to.
    pub(crate) fn sink_level(&self) -> u8 {
        match self.sink {
            ErrorSink::Current => self.current.err_level,
            ErrorSink::Appended(idx) => self.records.get(idx).map(|r| r.err_level).unwrap_or(0),
        }
    }

    /// Whether the current statement already carries a hard error.
    pub(crate) fn has_error(&self) -> bool {
        self.sink_level() == 2
    }

    /// The severity gate: errors always block EXECUTE, warnings block it
    /// unless the batch opted into ignoring them.
    pub(crate) fn gate_violated(&self) -> bool {
        self.records.max_level() == 2
            || (self.records.max_level() == 1 && !self.opt.ignore_warnings)
    }

    // ---- catalog resolution ----

    pub(crate) fn table_from_cache(&mut self, table: &TableRef, report: bool) -> Option<TableId> {
        let schema = table.schema_or(&self.db_name).to_string();
        self.get_table(&schema, &table.name, report)
    }

    /// `lookup(schema, name, reportIfMissing)` over the catalog cache, with
    /// a live `SHOW FULL FIELDS` fallback on a cache miss.
    pub(crate) fn get_table(&mut self, schema: &str, name: &str, report: bool) -> Option<TableId> {
        if let Some(id) = self.catalog.get(schema, name) {
            if self.catalog.table(id).is_deleted {
                if report {
                    self.append_error_no(CheckCode::TableNotExistedError, &[name]);
                }
                return None;
            }
            return Some(id);
        }

        let fields = self.query_table_from_db(schema, name, report)?;
        let mut table = TableInfo::new(schema, name);
        table.fields = fields;
        Some(self.catalog.insert(table))
    }

    fn query_table_from_db(
        &mut self,
        schema: &str,
        name: &str,
        report: bool,
    ) -> Option<Vec<FieldInfo>> {
        let result = match self.db.as_mut() {
            Some(db) => db.show_full_fields(schema, name),
            None => return None,
        };

        match result {
            Ok(fields) => Some(fields),
            Err(err) => {
                if err.code != ER_NO_SUCH_TABLE || report {
                    self.append_error_message(&format!("{}.", err.message));
                }
                None
            }
        }
    }

    // ---- target round-trips shared by checks and the executor ----

    pub(crate) fn check_binlog_is_on(&mut self) -> bool {
        let result = match self.db.as_mut() {
            Some(db) => db.show_variable("log_bin"),
            None => return false,
        };
        match result {
            Ok(value) => value.as_deref() == Some("ON"),
            Err(err) => {
                self.append_error_message(&err.message);
                false
            }
        }
    }

    pub(crate) fn check_binlog_format_is_row(&mut self) -> bool {
        let result = match self.db.as_mut() {
            Some(db) => db.show_variable("binlog_format"),
            None => return false,
        };
        match result {
            Ok(value) => value.as_deref() == Some("ROW"),
            Err(err) => {
                self.append_error_message(&err.message);
                false
            }
        }
    }

    pub(crate) fn modify_binlog_format_row(&mut self) {
        let result = match self.db.as_mut() {
            Some(db) => db.exec("set session binlog_format=row;"),
            None => return,
        };
        if let Err(err) = result {
            log::error!("failed to set binlog_format=row: {}", err);
            self.append_error_message(&err.message);
        }
    }

    pub(crate) fn fetch_master_position(&mut self) -> Option<BinlogPosition> {
        let result = match self.db.as_mut() {
            Some(db) => db.master_status(),
            None => return None,
        };
        match result {
            Ok(position) => position,
            Err(err) => {
                self.append_error_message(&err.message);
                None
            }
        }
    }

    pub(crate) fn fetch_thread_id(&mut self) -> u32 {
        let result = match self.db.as_mut() {
            Some(db) => db.connection_id(),
            None => return 0,
        };
        match result {
            Ok(id) => id,
            Err(err) => {
                self.append_error_message(&err.message);
                0
            }
        }
    }

    /// Estimated row count for the table, folded into the record.
    pub(crate) fn show_table_status(&mut self, id: TableId) {
        let (schema, name, new_cached) = {
            let t = self.catalog.table(id);
            (t.schema.clone(), t.name.clone(), t.new_cached)
        };
        if new_cached {
            return;
        }

        let result = match self.db.as_mut() {
            Some(db) => db.table_row_estimate(&schema, &name),
            None => return,
        };
        match result {
            Ok(Some(rows)) => match self.sink {
                ErrorSink::Current => self.current.affected_rows = rows,
                ErrorSink::Appended(idx) => {
                    if let Some(record) = self.records.get_mut(idx) {
                        record.affected_rows = rows;
                    }
                }
            },
            Ok(None) => {}
            Err(err) => self.append_error_message(&err.message),
        }
    }

    /// Store the table's CREATE text as the rollback for a DROP.
    pub(crate) fn show_create_table_rollback(&mut self, id: TableId) {
        let (schema, name, new_cached) = {
            let t = self.catalog.table(id);
            (t.schema.clone(), t.name.clone(), t.new_cached)
        };
        if new_cached {
            return;
        }

        let result = match self.db.as_mut() {
            Some(db) => db.show_create_table(&schema, &name),
            None => return,
        };
        match result {
            Ok(Some(create)) => {
                self.current.ddl_rollback = format!("{};", create);
            }
            Ok(None) => {}
            Err(err) => self.append_error_message(&err.message),
        }
    }

    /// EXPLAIN the statement and fold the first plan row's examined-rows
    /// figure into the record.
    pub(crate) fn explain_and_record(&mut self, explain_sql: &str) {
        let result = match self.db.as_mut() {
            Some(db) => db.explain(explain_sql),
            None => return,
        };
        match result {
            Ok(rows) => {
                if let Some(first) = rows.first() {
                    self.current.affected_rows = first.rows;
                }
            }
            Err(err) => self.append_error_message(&err.message),
        }
    }
}
