//! Error taxonomy of the review engine.
//!
//! Review findings are not Rust errors: every check appends a numbered
//! [`CheckCode`] (or a free-form message) to the current record, tagged with a
//! severity, and the batch keeps going so the client sees all findings in one
//! pass. Rust `Result` is reserved for failures of the machinery itself:
//! driver round-trips ([`DriverError`]), configuration loading, parsing.

use thiserror::Error;

/// Severity of a review finding. 0 = note, 1 = warning, 2 = error.
pub type Severity = u8;

/// Numbered review findings, one per rule the engine can trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckCode {
    SqlInvalidSource,
    InvalidBackupHostInfo,
    NotSupportedYet,
    TableMustInnodb,
    TableCharsetMustNull,
    TableMustHaveComment,
    TableMustHavePk,
    PartitionNotAllowed,
    InvalidDataType,
    CharToVarcharLen,
    CharsetOnColumn,
    ColumnHaveNoComment,
    UseTextOrBlob,
    TextNotNullableError,
    NotAllowedNullable,
    WrongColumnName,
    AutoincUnsigned,
    SetDataTypeIntBigint,
    TimestampDefault,
    DbNotExistedError,
    TableExistsError,
    TableNotExistedError,
    ColumnExisted,
    ColumnNotExisted,
    ChangeColumnType,
    DupIndex,
    TooManyKeys,
    TooLongKey,
    BlobUsedAsKey,
    CantDropFieldOrKey,
    CantDropTable,
    WrongValueCountOnRow,
    WithInsertField,
    TooLongBakdbName,
    TooLongIdent,
}

impl CheckCode {
    /// Canonical name, used as the key for severity overrides.
    pub fn name(&self) -> &'static str {
        match self {
            CheckCode::SqlInvalidSource => "ER_SQL_INVALID_SOURCE",
            CheckCode::InvalidBackupHostInfo => "ER_INVALID_BACKUP_HOST_INFO",
            CheckCode::NotSupportedYet => "ER_NOT_SUPPORTED_YET",
            CheckCode::TableMustInnodb => "ER_TABLE_MUST_INNODB",
            CheckCode::TableCharsetMustNull => "ER_TABLE_CHARSET_MUST_NULL",
            CheckCode::TableMustHaveComment => "ER_TABLE_MUST_HAVE_COMMENT",
            CheckCode::TableMustHavePk => "ER_TABLE_MUST_HAVE_PK",
            CheckCode::PartitionNotAllowed => "ER_PARTITION_NOT_ALLOWED",
            CheckCode::InvalidDataType => "ER_INVALID_DATA_TYPE",
            CheckCode::CharToVarcharLen => "ER_CHAR_TO_VARCHAR_LEN",
            CheckCode::CharsetOnColumn => "ER_CHARSET_ON_COLUMN",
            CheckCode::ColumnHaveNoComment => "ER_COLUMN_HAVE_NO_COMMENT",
            CheckCode::UseTextOrBlob => "ER_USE_TEXT_OR_BLOB",
            CheckCode::TextNotNullableError => "ER_TEXT_NOT_NULLABLE_ERROR",
            CheckCode::NotAllowedNullable => "ER_NOT_ALLOWED_NULLABLE",
            CheckCode::WrongColumnName => "ER_WRONG_COLUMN_NAME",
            CheckCode::AutoincUnsigned => "ER_AUTOINC_UNSIGNED",
            CheckCode::SetDataTypeIntBigint => "ER_SET_DATA_TYPE_INT_BIGINT",
            CheckCode::TimestampDefault => "ER_TIMESTAMP_DEFAULT",
            CheckCode::DbNotExistedError => "ER_DB_NOT_EXISTED_ERROR",
            CheckCode::TableExistsError => "ER_TABLE_EXISTS_ERROR",
            CheckCode::TableNotExistedError => "ER_TABLE_NOT_EXISTED_ERROR",
            CheckCode::ColumnExisted => "ER_COLUMN_EXISTED",
            CheckCode::ColumnNotExisted => "ER_COLUMN_NOT_EXISTED",
            CheckCode::ChangeColumnType => "ER_CHANGE_COLUMN_TYPE",
            CheckCode::DupIndex => "ER_DUP_INDEX",
            CheckCode::TooManyKeys => "ER_TOO_MANY_KEYS",
            CheckCode::TooLongKey => "ER_TOO_LONG_KEY",
            CheckCode::BlobUsedAsKey => "ER_BLOB_USED_AS_KEY",
            CheckCode::CantDropFieldOrKey => "ER_CANT_DROP_FIELD_OR_KEY",
            CheckCode::CantDropTable => "ER_CANT_DROP_TABLE",
            CheckCode::WrongValueCountOnRow => "ER_WRONG_VALUE_COUNT_ON_ROW",
            CheckCode::WithInsertField => "ER_WITH_INSERT_FIELD",
            CheckCode::TooLongBakdbName => "ER_TOO_LONG_BAKDB_NAME",
            CheckCode::TooLongIdent => "ER_TOO_LONG_IDENT",
        }
    }

    /// Default severity. Structural and safety violations are errors (2),
    /// style concerns are warnings (1). Overridable per code in the config.
    pub fn default_severity(&self) -> Severity {
        match self {
            CheckCode::WithInsertField => 0,
            CheckCode::TableCharsetMustNull
            | CheckCode::TableMustHaveComment
            | CheckCode::ColumnHaveNoComment
            | CheckCode::NotAllowedNullable
            | CheckCode::CharToVarcharLen
            | CheckCode::UseTextOrBlob
            | CheckCode::CharsetOnColumn
            | CheckCode::TimestampDefault => 1,
            _ => 2,
        }
    }

    /// Message template; `{}` placeholders are filled positionally.
    fn template(&self) -> &'static str {
        match self {
            CheckCode::SqlInvalidSource => "Invalid source information.",
            CheckCode::InvalidBackupHostInfo => "Invalid backup host information.",
            CheckCode::NotSupportedYet => "Not supported statement type.",
            CheckCode::TableMustInnodb => "Set engine to innodb for table '{}'.",
            CheckCode::TableCharsetMustNull => "Not allowed to set charset for table '{}'.",
            CheckCode::TableMustHaveComment => "Set comments for table '{}'.",
            CheckCode::TableMustHavePk => "Set a primary key for table '{}'.",
            CheckCode::PartitionNotAllowed => "Partition is not allowed.",
            CheckCode::InvalidDataType => "Not supported data type on field: '{}'.",
            CheckCode::CharToVarcharLen => "Set char to varchar for field '{}'.",
            CheckCode::CharsetOnColumn => "Not allowed to set charset for column '{}.{}'.",
            CheckCode::ColumnHaveNoComment => "Column '{}' in table '{}' has no comment.",
            CheckCode::UseTextOrBlob => "Type blob/text is used on column '{}'.",
            CheckCode::TextNotNullableError => {
                "TEXT/BLOB column '{}' in table '{}' can't be NOT NULL."
            }
            CheckCode::NotAllowedNullable => "Column '{}' in table '{}' can't be nullable.",
            CheckCode::WrongColumnName => "Incorrect column name '{}'.",
            CheckCode::AutoincUnsigned => {
                "Set unsigned attribute on auto-increment column in table '{}'."
            }
            CheckCode::SetDataTypeIntBigint => {
                "Set auto-increment data type to int or bigint."
            }
            CheckCode::TimestampDefault => "Set default value for timestamp column '{}'.",
            CheckCode::DbNotExistedError => "Database '{}' does not exist.",
            CheckCode::TableExistsError => "Table '{}' already exists.",
            CheckCode::TableNotExistedError => "Table '{}' doesn't exist.",
            CheckCode::ColumnExisted => "Column '{}' already exists.",
            CheckCode::ColumnNotExisted => "Column '{}' does not exist.",
            CheckCode::ChangeColumnType => "Type conversion for column '{}' ({} -> {}).",
            CheckCode::DupIndex => "Duplicate index '{}' defined on the table '{}.{}'.",
            CheckCode::TooManyKeys => "Too many keys on table '{}', max {} keys allowed.",
            CheckCode::TooLongKey => "Specified key '{}' was too long; max key length is {} bytes.",
            CheckCode::BlobUsedAsKey => "BLOB column '{}' can't be used in key specification.",
            CheckCode::CantDropFieldOrKey => "Can't DROP '{}'; check that column/key exists.",
            CheckCode::CantDropTable => "Command is forbidden! Cannot drop table '{}'.",
            CheckCode::WrongValueCountOnRow => {
                "Column count doesn't match value count at row {}."
            }
            CheckCode::WithInsertField => "Set the field list for insert statements.",
            CheckCode::TooLongBakdbName => {
                "Backup database name '{}_{}_{}' exceeds the max database name length."
            }
            CheckCode::TooLongIdent => "Identifier name '{}' is too long.",
        }
    }

    /// Render the message, substituting `{}` placeholders in order. Surplus
    /// placeholders stay in place, surplus arguments are dropped.
    pub fn format(&self, args: &[&str]) -> String {
        let mut out = self.template().to_string();
        for arg in args {
            if let Some(pos) = out.find("{}") {
                out.replace_range(pos..pos + 2, arg);
            }
        }
        out
    }
}

/// MySQL code for "database exists" on CREATE DATABASE.
pub const ER_DB_CREATE_EXISTS: u16 = 1007;
/// MySQL code for "table exists" on CREATE TABLE.
pub const ER_TABLE_EXISTS: u16 = 1050;
/// MySQL code for "table doesn't exist".
pub const ER_NO_SUCH_TABLE: u16 = 1146;

/// Error surfaced by the remote driver, carrying the vendor code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct DriverError {
    /// Vendor error code; 0 when the failure is not a server response.
    pub code: u16,
    pub message: String,
}

impl DriverError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Connection-level failure with no vendor code.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }
}
