//! Per-statement review records and the client-facing result row.

use super::TableId;
use serde::{Deserialize, Serialize};

/// Processing phase a record last went through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    Check,
    Exec,
    Backup,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Check => "CHECK",
            Stage::Exec => "EXECUTE",
            Stage::Backup => "BACKUP",
        }
    }
}

/// Outcome of the record's latest phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    /// Audit finished; nothing executed yet.
    #[default]
    Ok,
    ExecOk,
    ExecFail,
    BackupOk,
    BackupFail,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Ok => "OK",
            StageStatus::ExecOk => "EXEC_OK",
            StageStatus::ExecFail => "EXEC_FAIL",
            StageStatus::BackupOk => "BACKUP_OK",
            StageStatus::BackupFail => "BACKUP_FAIL",
        }
    }
}

/// Statement kind tag; drives executor routing and the backup `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    Insert,
    Delete,
    Update,
    Use,
    CreateDatabase,
    DropDatabase,
    CreateTable,
    AlterTable,
    DropTable,
    RenameTable,
    TruncateTable,
    CreateIndex,
    DropIndex,
    CreateView,
    Show,
    InceptionSet,
    InceptionStart,
    InceptionCommit,
    Unsupported,
}

impl StatementKind {
    /// true for statements whose effects are captured via binlog windows.
    pub fn is_dml(&self) -> bool {
        matches!(
            self,
            StatementKind::Insert | StatementKind::Delete | StatementKind::Update
        )
    }

    /// true for statements whose rollback is synthesized as inverse DDL.
    pub fn is_ddl(&self) -> bool {
        matches!(
            self,
            StatementKind::CreateTable
                | StatementKind::AlterTable
                | StatementKind::DropTable
                | StatementKind::CreateIndex
                | StatementKind::DropIndex
        )
    }

    /// Value written to the backup operation table's `type` column.
    pub fn backup_type(&self) -> &'static str {
        match self {
            StatementKind::Insert => "INSERT",
            StatementKind::Delete => "DELETE",
            StatementKind::Update => "UPDATE",
            StatementKind::CreateDatabase => "CREATEDB",
            StatementKind::CreateTable => "CREATETABLE",
            StatementKind::AlterTable => "ALTERTABLE",
            StatementKind::DropTable => "DROPTABLE",
            StatementKind::RenameTable => "RENAMETABLE",
            StatementKind::CreateIndex => "CREATEINDEX",
            StatementKind::DropIndex => "DROPINDEX",
            _ => "UNKNOWN",
        }
    }
}

/// One record per input statement: the review verdict plus everything the
/// execute and backup phases accumulate on top of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Position in the batch, starting at 0 with the begin marker.
    pub seq_no: usize,
    pub sql: String,
    pub kind: StatementKind,
    pub stage: Stage,
    pub stage_status: StageStatus,
    /// Running max severity of the findings appended to this record.
    pub err_level: u8,
    /// Newline-joined finding messages.
    pub buf: String,

    pub affected_rows: u64,
    /// Wall-clock execution time, seconds with 3 decimals.
    pub exec_time: String,
    /// Unix timestamp of execution; part of the OPID.
    pub exec_timestamp: i64,
    pub thread_id: u32,
    pub opid: String,

    pub start_file: String,
    pub start_position: u64,
    pub end_file: String,
    pub end_position: u64,

    /// Inverse DDL text, when this record is DDL and execution is on.
    pub ddl_rollback: String,
    /// Resolved table in the session catalog, when any.
    pub table: Option<TableId>,
    /// Schema/table names noted at CHECK time for post-execute resolution.
    pub db_name: String,
    pub table_name: String,
    pub backup_db_name: String,
}

impl Record {
    pub fn new(seq_no: usize, sql: impl Into<String>, kind: StatementKind) -> Self {
        Self {
            seq_no,
            sql: sql.into(),
            kind,
            stage: Stage::Check,
            stage_status: StageStatus::Ok,
            err_level: 0,
            buf: String::new(),
            affected_rows: 0,
            exec_time: "0.000".to_string(),
            exec_timestamp: 0,
            thread_id: 0,
            opid: String::new(),
            start_file: String::new(),
            start_position: 0,
            end_file: String::new(),
            end_position: 0,
            ddl_rollback: String::new(),
            table: None,
            db_name: String::new(),
            table_name: String::new(),
            backup_db_name: String::new(),
        }
    }

    /// Append one finding line, raising the record severity to `level`.
    pub fn append_error(&mut self, level: u8, msg: &str) {
        self.err_level = self.err_level.max(level);
        self.buf.push_str(msg);
        self.buf.push('\n');
    }

    /// The client-facing row for this record.
    pub fn to_row(&self) -> ResultRow {
        ResultRow {
            ordinal: self.seq_no,
            stage: self.stage.as_str().to_string(),
            stage_status: self.stage_status.as_str().to_string(),
            err_level: self.err_level,
            error_message: self.buf.trim_end().to_string(),
            sql: self.sql.clone(),
            affected_rows: self.affected_rows,
            execute_time: self.exec_time.clone(),
            backup_dbname: self.backup_db_name.clone(),
            opid: self.opid.clone(),
        }
    }
}

/// Row shape returned to clients, one per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub ordinal: usize,
    pub stage: String,
    pub stage_status: String,
    pub err_level: u8,
    pub error_message: String,
    pub sql: String,
    pub affected_rows: u64,
    pub execute_time: String,
    pub backup_dbname: String,
    pub opid: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_error_raises_level_monotonically() {
        let mut r = Record::new(0, "SELECT 1", StatementKind::Unsupported);
        r.append_error(1, "style warning");
        assert_eq!(r.err_level, 1);
        r.append_error(2, "hard error");
        assert_eq!(r.err_level, 2);
        r.append_error(0, "note");
        assert_eq!(r.err_level, 2);
        assert_eq!(r.buf, "style warning\nhard error\nnote\n");
    }

    #[test]
    fn test_result_row_trims_trailing_newline() {
        let mut r = Record::new(3, "INSERT INTO t VALUES (1)", StatementKind::Insert);
        r.append_error(2, "boom");
        let row = r.to_row();
        assert_eq!(row.error_message, "boom");
        assert_eq!(row.ordinal, 3);
        assert_eq!(row.stage, "CHECK");
    }

    #[test]
    fn test_kind_classification() {
        assert!(StatementKind::Update.is_dml());
        assert!(!StatementKind::Update.is_ddl());
        assert!(StatementKind::DropIndex.is_ddl());
        assert_eq!(StatementKind::RenameTable.backup_type(), "RENAMETABLE");
        assert_eq!(StatementKind::Show.backup_type(), "UNKNOWN");
    }
}
