//! Commit-phase driver: the severity gate, the ordered EXECUTE pass, and
//! the handoff to the backup writer.

use crate::driver::{Connection, Connector};
use crate::session::{ErrorSink, Session};
use sqlgate_commons::errors::CheckCode;
use sqlgate_commons::models::{Stage, StageStatus, StatementKind};
use std::time::Instant;

impl<C: Connector> Session<C> {
    /// COMMITTING: apply the gate, enforce binlog preconditions, execute
    /// accepted statements in order, then materialize rollback data.
    pub(crate) fn execute_commit(&mut self) {
        if self.opt.check {
            return;
        }

        if self.gate_violated() {
            return;
        }

        // commit-phase failures surface on the first record
        self.sink = ErrorSink::Appended(0);

        if self.opt.backup {
            if !self.check_binlog_is_on() {
                self.append_error_message("binlog not enabled, cannot backup!");
                return;
            }

            if !self.check_binlog_format_is_row() {
                self.modify_binlog_format_row();
            }
        }

        if self.gate_violated() {
            return;
        }

        self.execute_all_statements();

        if self.gate_violated() {
            return;
        }

        if self.opt.backup {
            self.write_backup_records();
        }
    }

    fn execute_all_statements(&mut self) {
        log::info!("audit passed, executing batch");

        for idx in 0..self.records.len() {
            let kind = match self.records.get(idx) {
                Some(record) => record.kind,
                None => break,
            };

            // statements with no remote effect are skipped during EXECUTE
            if matches!(
                kind,
                StatementKind::Show | StatementKind::InceptionStart | StatementKind::InceptionSet
            ) {
                continue;
            }

            self.sink = ErrorSink::Appended(idx);
            if let Some(record) = self.records.get_mut(idx) {
                record.stage = Stage::Exec;
            }

            match kind {
                StatementKind::Insert | StatementKind::Delete | StatementKind::Update => {
                    self.execute_remote_statement_and_backup(idx);
                }
                StatementKind::Use
                | StatementKind::CreateDatabase
                | StatementKind::DropDatabase
                | StatementKind::CreateTable
                | StatementKind::AlterTable
                | StatementKind::DropTable
                | StatementKind::RenameTable
                | StatementKind::TruncateTable
                | StatementKind::CreateIndex
                | StatementKind::DropIndex => {
                    self.execute_remote_statement(idx);
                }
                _ => {
                    self.append_error_no(CheckCode::NotSupportedYet, &[]);
                }
            }

            if self.sink_level() == 2 {
                break;
            }
        }
    }

    /// Run one record's SQL against the target, folding timing, affected
    /// rows and the executing thread id into the record.
    fn execute_remote_statement(&mut self, idx: usize) {
        let (sql, kind) = match self.records.get(idx) {
            Some(record) => (record.sql.clone(), record.kind),
            None => return,
        };

        let start = Instant::now();
        let result = match self.db.as_mut() {
            Some(db) => db.exec(&sql),
            None => return,
        };
        let elapsed = start.elapsed().as_secs_f64();

        if let Some(record) = self.records.get_mut(idx) {
            record.exec_time = format!("{:.3}", elapsed);
            record.exec_timestamp = chrono::Utc::now().timestamp();
        }

        match result {
            Err(err) => {
                log::error!("execute failed: {}", err);
                self.append_error_message(&err.message);
                if let Some(record) = self.records.get_mut(idx) {
                    record.stage_status = StageStatus::ExecFail;
                }
            }
            Ok(affected) => {
                let thread_id = self.fetch_thread_id();
                if let Some(record) = self.records.get_mut(idx) {
                    record.affected_rows = affected;
                    record.stage_status = StageStatus::ExecOk;
                    record.thread_id = thread_id;
                }

                // a CREATE TABLE that could not be modeled during CHECK is
                // resolvable from the live catalog once it exists
                if kind == StatementKind::CreateTable {
                    let (table, db_name, table_name) = match self.records.get(idx) {
                        Some(r) => (r.table, r.db_name.clone(), r.table_name.clone()),
                        None => return,
                    };
                    if table.is_none() && !db_name.is_empty() && !table_name.is_empty() {
                        let resolved = self.get_table(&db_name, &table_name, true);
                        if let Some(record) = self.records.get_mut(idx) {
                            record.table = resolved;
                        }
                    }
                }
            }
        }
    }

    /// DML execution bracketed by master-position reads, giving the binlog
    /// window a downstream parser turns into inverse row events.
    fn execute_remote_statement_and_backup(&mut self, idx: usize) {
        if self.opt.backup {
            if let Some(position) = self.fetch_master_position() {
                if let Some(record) = self.records.get_mut(idx) {
                    record.start_file = position.file;
                    record.start_position = position.position;
                }
            }
        }

        self.execute_remote_statement(idx);

        if self.opt.backup {
            if let Some(position) = self.fetch_master_position() {
                if let Some(record) = self.records.get_mut(idx) {
                    record.end_file = position.file;
                    record.end_position = position.position;
                }
            }
        }
    }
}
