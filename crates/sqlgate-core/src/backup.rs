//! Backup writer: per-source backup schema, the operation-info table, and
//! per-table rollback tables.

use crate::driver::{Connection, Connector};
use crate::rollback::{escape_sql_string, make_opid};
use crate::session::{ErrorSink, Session};
use sqlgate_commons::constants::{MAX_DATABASE_NAME_LENGTH, REMOTE_BACKUP_TABLE};
use sqlgate_commons::errors::{CheckCode, ER_DB_CREATE_EXISTS, ER_TABLE_EXISTS};
use sqlgate_commons::models::{Stage, StageStatus};

impl<C: Connector> Session<C> {
    /// BACKUP: visit records a third time in order, materializing operation
    /// rows and DDL rollback rows. A failed write halts the pass.
    pub(crate) fn write_backup_records(&mut self) {
        for idx in 0..self.records.len() {
            let kind = match self.records.get(idx) {
                Some(record) => record.kind,
                None => break,
            };
            if !(kind.is_dml() || kind.is_ddl()) {
                continue;
            }

            self.sink = ErrorSink::Appended(idx);
            if let Some(record) = self.records.get_mut(idx) {
                record.stage = Stage::Backup;
            }

            if self.create_backup_tables(idx) == 2 {
                break;
            }

            let has_table = self
                .records
                .get(idx)
                .map(|r| r.table.is_some())
                .unwrap_or(false);
            if !has_table {
                self.append_error_message(
                    "Missing table structure information, backup not generated!",
                );
                continue;
            }

            if self.backup_record(idx) == 2 {
                break;
            }
        }
    }

    /// Lazily create the backup database, the per-source-table rollback
    /// table and the operation-info table. Existing objects are fine (1007,
    /// 1050); anything else halts the backup pass.
    fn create_backup_tables(&mut self, idx: usize) -> u8 {
        let Some(table_id) = self.records.get(idx).and_then(|r| r.table) else {
            return 0;
        };

        if self.catalog.table(table_id).is_created {
            return 0;
        }

        self.catalog.table_mut(table_id).derive_primary_cols();

        let Some(backup_db) = self.remote_backup_db_name(idx) else {
            return 2;
        };

        if !self.backup_db_cache.contains(&backup_db) {
            let sql = format!("create database if not exists `{}`;", backup_db);
            if self.backup_exec_tolerating(&sql, ER_DB_CREATE_EXISTS) == 2 {
                return 2;
            }
            self.backup_db_cache.insert(backup_db.clone());
        }

        let table_name = self.catalog.table(table_id).name.clone();

        let key = format!("{}.{}", backup_db, table_name);
        if !self.backup_table_cache.contains(&key) {
            let sql = rollback_table_ddl(&backup_db, &table_name);
            if self.backup_exec_tolerating(&sql, ER_TABLE_EXISTS) == 2 {
                return 2;
            }
            self.backup_table_cache.insert(key);
        }

        let key = format!("{}.{}", backup_db, REMOTE_BACKUP_TABLE);
        if !self.backup_table_cache.contains(&key) {
            let sql = backup_info_table_ddl(&backup_db);
            if self.backup_exec_tolerating(&sql, ER_TABLE_EXISTS) == 2 {
                return 2;
            }
            self.backup_table_cache.insert(key);
        }

        self.catalog.table_mut(table_id).is_created = true;
        self.sink_level()
    }

    /// Execute DDL on the backup connection, tolerating one benign vendor
    /// code. Returns 2 on a real failure.
    fn backup_exec_tolerating(&mut self, sql: &str, benign_code: u16) -> u8 {
        let result = match self.backup_db.as_mut() {
            Some(db) => db.exec(sql),
            None => return 2,
        };
        match result {
            Ok(_) => 0,
            Err(err) if err.code == benign_code => 0,
            Err(err) => {
                log::error!("backup ddl failed: {}", err);
                self.append_error_message(&err.message);
                2
            }
        }
    }

    /// `host_port_schema` with `-` and `.` folded to `_`; memoized on the
    /// record.
    fn remote_backup_db_name(&mut self, idx: usize) -> Option<String> {
        if let Some(record) = self.records.get(idx) {
            if !record.backup_db_name.is_empty() {
                return Some(record.backup_db_name.clone());
            }
        }

        let table_id = self.records.get(idx).and_then(|r| r.table)?;
        let schema = self.catalog.table(table_id).schema.clone();

        let raw = format!("{}_{}_{}", self.opt.host, self.opt.port, schema);
        if raw.len() > MAX_DATABASE_NAME_LENGTH {
            let port = self.opt.port.to_string();
            let host = self.opt.host.clone();
            self.append_error_no(CheckCode::TooLongBakdbName, &[&host, &port, &schema]);
            return None;
        }

        let name = raw.replace('-', "_").replace('.', "_");
        if let Some(record) = self.records.get_mut(idx) {
            record.backup_db_name = name.clone();
        }
        Some(name)
    }

    /// Write the operation row, and the rollback-statement row for DDL.
    fn backup_record(&mut self, idx: usize) -> u8 {
        let kind = match self.records.get(idx) {
            Some(record) => record.kind,
            None => return 0,
        };

        let status = self.write_backup_info_row(idx);
        if status == 2 {
            return 2;
        }

        if kind.is_ddl() {
            return self.write_ddl_rollback_row(idx);
        }

        if let Some(record) = self.records.get_mut(idx) {
            record.stage_status = StageStatus::BackupOk;
        }
        0
    }

    fn write_backup_info_row(&mut self, idx: usize) -> u8 {
        let Some(backup_db) = self.remote_backup_db_name(idx) else {
            return 2;
        };

        let (sql, opid) = {
            let Some(record) = self.records.get(idx) else {
                return 0;
            };
            let Some(table_id) = record.table else {
                return 0;
            };
            let table = self.catalog.table(table_id);

            let opid = make_opid(record.exec_timestamp, record.thread_id, record.seq_no);

            let mut buf = String::from("INSERT INTO ");
            buf.push_str(&format!("`{}`.`{}`", backup_db, REMOTE_BACKUP_TABLE));
            buf.push_str(" VALUES('");
            buf.push_str(&opid);
            buf.push_str("','");
            buf.push_str(&record.start_file);
            buf.push_str("',");
            buf.push_str(&record.start_position.to_string());
            buf.push_str(",'");
            buf.push_str(&record.end_file);
            buf.push_str("',");
            buf.push_str(&record.end_position.to_string());
            buf.push_str(",'");
            buf.push_str(&escape_sql_string(&record.sql));
            buf.push_str("','");
            buf.push_str(&self.opt.host);
            buf.push_str("','");
            buf.push_str(&table.schema);
            buf.push_str("','");
            buf.push_str(&table.name);
            buf.push_str("',");
            buf.push_str(&self.opt.port.to_string());
            buf.push_str(",NOW(),'");
            buf.push_str(record.kind.backup_type());
            buf.push_str("')");

            (buf, opid)
        };

        if let Some(record) = self.records.get_mut(idx) {
            record.opid = opid;
        }

        let result = match self.backup_db.as_mut() {
            Some(db) => db.exec(&sql),
            None => return 2,
        };
        match result {
            Ok(_) => 0,
            Err(err) => {
                self.append_error_message(&err.message);
                if let Some(record) = self.records.get_mut(idx) {
                    record.stage_status = StageStatus::BackupFail;
                }
                2
            }
        }
    }

    fn write_ddl_rollback_row(&mut self, idx: usize) -> u8 {
        let rollback = match self.records.get(idx) {
            Some(record) => record.ddl_rollback.clone(),
            None => return 0,
        };
        if rollback.is_empty() {
            return 0;
        }

        let Some(backup_db) = self.remote_backup_db_name(idx) else {
            return 2;
        };

        let sql = {
            let Some(record) = self.records.get(idx) else {
                return 0;
            };
            let Some(table_id) = record.table else {
                return 0;
            };
            let table_name = self.catalog.table(table_id).name.clone();

            format!(
                "INSERT INTO `{}`.`{}`(rollback_statement, opid_time) VALUES('{}','{}')",
                backup_db,
                table_name,
                escape_sql_string(&rollback),
                record.opid
            )
        };

        let result = match self.backup_db.as_mut() {
            Some(db) => db.exec(&sql),
            None => return 2,
        };
        match result {
            Ok(_) => {
                if let Some(record) = self.records.get_mut(idx) {
                    record.stage_status = StageStatus::BackupOk;
                }
                0
            }
            Err(err) => {
                self.append_error_message(&err.message);
                if let Some(record) = self.records.get_mut(idx) {
                    record.stage_status = StageStatus::BackupFail;
                }
                2
            }
        }
    }
}

/// DDL for the per-source-table rollback table.
fn rollback_table_ddl(backup_db: &str, table_name: &str) -> String {
    let mut buf = String::from("CREATE TABLE if not exists ");
    buf.push_str(&format!("`{}`.`{}`", backup_db, table_name));
    buf.push('(');
    buf.push_str("id bigint auto_increment primary key, ");
    buf.push_str("rollback_statement mediumtext, ");
    buf.push_str("opid_time varchar(50)");
    buf.push_str(") ENGINE INNODB DEFAULT CHARSET UTF8;");
    buf
}

/// DDL for the global operation-info table.
fn backup_info_table_ddl(backup_db: &str) -> String {
    let mut buf = String::from("CREATE TABLE if not exists ");
    buf.push_str(&format!("`{}`.`{}`", backup_db, REMOTE_BACKUP_TABLE));
    buf.push('(');
    buf.push_str("opid_time varchar(50),");
    buf.push_str("start_binlog_file varchar(512),");
    buf.push_str("start_binlog_pos int,");
    buf.push_str("end_binlog_file varchar(512),");
    buf.push_str("end_binlog_pos int,");
    buf.push_str("sql_statement text,");
    buf.push_str("host VARCHAR(64),");
    buf.push_str("dbname VARCHAR(64),");
    buf.push_str("tablename VARCHAR(64),");
    buf.push_str("port INT,");
    buf.push_str("time TIMESTAMP,");
    buf.push_str("type VARCHAR(20),");
    buf.push_str("PRIMARY KEY(opid_time)");
    buf.push_str(")ENGINE INNODB DEFAULT CHARSET UTF8;");
    buf
}
