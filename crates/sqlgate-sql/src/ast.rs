//! Engine-owned statement model.
//!
//! The rule engine never touches raw `sqlparser` nodes; the parser converts
//! every statement into the tagged variants below, which carry exactly what
//! the checks and the rollback synthesizer consume.

use once_cell::sync::Lazy;
use regex::Regex;
use sqlgate_commons::models::{FieldInfo, StatementKind};

static RE_FIELD_LEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.*?\((\d)").unwrap());

/// Optionally schema-qualified table reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
        }
    }

    /// Schema to use, falling back to the session default.
    pub fn schema_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.schema.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => default,
        }
    }
}

/// Column data type with the attributes the checks need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    TinyInt { width: Option<u64>, unsigned: bool },
    SmallInt { width: Option<u64>, unsigned: bool },
    MediumInt { width: Option<u64>, unsigned: bool },
    Int { width: Option<u64>, unsigned: bool },
    BigInt { width: Option<u64>, unsigned: bool },
    Decimal { precision: Option<u64>, scale: Option<u64>, unsigned: bool },
    Float,
    Double,
    Char { len: Option<u64> },
    Varchar { len: Option<u64> },
    TinyText,
    Text,
    MediumText,
    LongText,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    Enum(Vec<String>),
    Set(Vec<String>),
    Bit { len: Option<u64> },
    Date,
    DateTime { fsp: Option<u64> },
    Timestamp { fsp: Option<u64> },
    Time { fsp: Option<u64> },
    Json,
    Binary { len: Option<u64> },
    Varbinary { len: Option<u64> },
    Other(String),
}

impl FieldType {
    /// BLOB/TEXT family, the way the live catalog reports them.
    pub fn is_blob_or_text(&self) -> bool {
        matches!(
            self,
            FieldType::TinyText
                | FieldType::Text
                | FieldType::MediumText
                | FieldType::LongText
                | FieldType::TinyBlob
                | FieldType::Blob
                | FieldType::MediumBlob
                | FieldType::LongBlob
        )
    }

    /// Types AUTO_INCREMENT is allowed on.
    pub fn allows_auto_increment(&self) -> bool {
        matches!(
            self,
            FieldType::Int { .. } | FieldType::BigInt { .. } | FieldType::MediumInt { .. }
        )
    }

    pub fn is_unsigned(&self) -> bool {
        match self {
            FieldType::TinyInt { unsigned, .. }
            | FieldType::SmallInt { unsigned, .. }
            | FieldType::MediumInt { unsigned, .. }
            | FieldType::Int { unsigned, .. }
            | FieldType::BigInt { unsigned, .. }
            | FieldType::Decimal { unsigned, .. } => *unsigned,
            _ => false,
        }
    }

    /// Families where a type change is allowed to resize within the family
    /// rather than requiring an exact match.
    pub fn is_resizable_family(&self) -> bool {
        matches!(
            self,
            FieldType::Decimal { .. } | FieldType::Char { .. } | FieldType::Varchar { .. }
        )
    }

    fn int_repr(name: &str, width: &Option<u64>, unsigned: bool, defaults: (u64, u64)) -> String {
        let w = width.unwrap_or(if unsigned { defaults.1 } else { defaults.0 });
        if unsigned {
            format!("{}({}) unsigned", name, w)
        } else {
            format!("{}({})", name, w)
        }
    }

    /// Render the type the way `SHOW FULL FIELDS` would, so cached columns
    /// compare cleanly against live ones. Integer display widths fall back
    /// to the server defaults when the statement omits them.
    pub fn compact_str(&self) -> String {
        match self {
            FieldType::TinyInt { width, unsigned } => {
                Self::int_repr("tinyint", width, *unsigned, (4, 3))
            }
            FieldType::SmallInt { width, unsigned } => {
                Self::int_repr("smallint", width, *unsigned, (6, 5))
            }
            FieldType::MediumInt { width, unsigned } => {
                Self::int_repr("mediumint", width, *unsigned, (9, 8))
            }
            FieldType::Int { width, unsigned } => Self::int_repr("int", width, *unsigned, (11, 10)),
            FieldType::BigInt { width, unsigned } => {
                Self::int_repr("bigint", width, *unsigned, (20, 20))
            }
            FieldType::Decimal {
                precision,
                scale,
                unsigned,
            } => {
                let base = match (precision, scale) {
                    (Some(p), Some(s)) => format!("decimal({},{})", p, s),
                    (Some(p), None) => format!("decimal({},0)", p),
                    _ => "decimal(10,0)".to_string(),
                };
                if *unsigned {
                    format!("{} unsigned", base)
                } else {
                    base
                }
            }
            FieldType::Float => "float".to_string(),
            FieldType::Double => "double".to_string(),
            FieldType::Char { len } => format!("char({})", len.unwrap_or(1)),
            FieldType::Varchar { len } => match len {
                Some(l) => format!("varchar({})", l),
                None => "varchar".to_string(),
            },
            FieldType::TinyText => "tinytext".to_string(),
            FieldType::Text => "text".to_string(),
            FieldType::MediumText => "mediumtext".to_string(),
            FieldType::LongText => "longtext".to_string(),
            FieldType::TinyBlob => "tinyblob".to_string(),
            FieldType::Blob => "blob".to_string(),
            FieldType::MediumBlob => "mediumblob".to_string(),
            FieldType::LongBlob => "longblob".to_string(),
            FieldType::Enum(values) => {
                let inner: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
                format!("enum({})", inner.join(","))
            }
            FieldType::Set(values) => {
                let inner: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
                format!("set({})", inner.join(","))
            }
            FieldType::Bit { len } => match len {
                Some(l) => format!("bit({})", l),
                None => "bit(1)".to_string(),
            },
            FieldType::Date => "date".to_string(),
            FieldType::DateTime { fsp } => match fsp {
                Some(f) => format!("datetime({})", f),
                None => "datetime".to_string(),
            },
            FieldType::Timestamp { fsp } => match fsp {
                Some(f) => format!("timestamp({})", f),
                None => "timestamp".to_string(),
            },
            FieldType::Time { fsp } => match fsp {
                Some(f) => format!("time({})", f),
                None => "time".to_string(),
            },
            FieldType::Json => "json".to_string(),
            FieldType::Binary { len } => format!("binary({})", len.unwrap_or(1)),
            FieldType::Varbinary { len } => match len {
                Some(l) => format!("varbinary({})", l),
                None => "varbinary".to_string(),
            },
            FieldType::Other(name) => name.to_ascii_lowercase(),
        }
    }
}

/// Byte length a column of the given rendered type contributes to an index
/// key. Known fixed-size prefixes take precedence; everything else falls
/// back to the first digit of the parenthesized length.
pub fn field_byte_length(tp: &str) -> usize {
    let prefix = match tp.find('(') {
        Some(pos) => &tp[..pos],
        None => tp,
    };

    let fallback = RE_FIELD_LEN
        .captures(tp)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .unwrap_or(0);

    match prefix {
        "bit" | "tinyint" | "bool" | "year" => 1,
        "small" => 2,
        "date" | "int" | "integer" | "timestamp" | "time" => 4,
        "bigint" | "datetime" => 8,
        _ => fallback,
    }
}

/// Position clause of ADD/MODIFY/CHANGE COLUMN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPosition {
    First,
    After(String),
}

/// One column definition with the attributes the field checks consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub not_null: bool,
    pub auto_increment: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub default_value: Option<String>,
    pub comment: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            charset: None,
            collation: None,
            not_null: false,
            auto_increment: false,
            primary_key: false,
            unique: false,
            default_value: None,
            comment: None,
        }
    }

    /// The cached-catalog shape of this column.
    pub fn to_field_info(&self) -> FieldInfo {
        FieldInfo {
            field: self.name.clone(),
            field_type: self.field_type.compact_str(),
            null: if self.not_null { "NO" } else { "YES" }.to_string(),
            key: if self.primary_key {
                "PRI"
            } else if self.unique {
                "UNI"
            } else {
                ""
            }
            .to_string(),
            default_value: self.default_value.clone().unwrap_or_default(),
            extra: String::new(),
            comment: self.comment.clone().unwrap_or_default(),
        }
    }

    /// NOT NULL declared with no DEFAULT clause.
    pub fn has_no_default_flag(&self) -> bool {
        self.not_null && self.default_value.is_none()
    }
}

/// Table-level options of CREATE TABLE.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOptions {
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
}

/// Table-level constraints of CREATE TABLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableConstraintDef {
    PrimaryKey { columns: Vec<String> },
    Unique { name: String, columns: Vec<String> },
    Index { name: String, columns: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableStmt {
    pub table: TableRef,
    pub if_not_exists: bool,
    /// CREATE TABLE ... LIKE source.
    pub like: Option<TableRef>,
    pub columns: Vec<ColumnDefinition>,
    pub constraints: Vec<TableConstraintDef>,
    pub options: TableOptions,
    pub has_partition: bool,
}

/// One ALTER TABLE specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterSpec {
    AddColumn {
        columns: Vec<ColumnDefinition>,
        position: Option<ColumnPosition>,
    },
    DropColumn {
        name: String,
    },
    ModifyColumn {
        column: ColumnDefinition,
        position: Option<ColumnPosition>,
    },
    ChangeColumn {
        old_name: String,
        column: ColumnDefinition,
        position: Option<ColumnPosition>,
    },
    AddIndex {
        name: String,
        unique: bool,
        columns: Vec<String>,
    },
    AddPrimaryKey {
        columns: Vec<String>,
    },
    DropIndex {
        name: String,
    },
    DropPrimaryKey,
    DropForeignKey {
        name: String,
    },
    RenameTable {
        new_table: TableRef,
    },
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterTableStmt {
    pub table: TableRef,
    pub specs: Vec<AlterSpec>,
}

/// INSERT ... SELECT source details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertSelect {
    /// The single source table, when the FROM clause is one plain table.
    pub from: Option<TableRef>,
    pub field_count: usize,
    pub wildcard: bool,
    /// Raw SELECT text, fed to EXPLAIN.
    pub select_sql: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStmt {
    /// Target table; None when the target clause is not a single plain table.
    pub table: Option<TableRef>,
    pub columns: Vec<String>,
    /// Arity of each VALUES row.
    pub row_arities: Vec<usize>,
    pub select: Option<InsertSelect>,
    /// INSERT ... SET assignment form.
    pub has_set_list: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStmt {
    /// Every table referenced by the join tree, aliases preserved.
    pub tables: Vec<TableRef>,
    /// Table qualifier of the last SET assignment, lowercased; empty if none.
    pub set_table: String,
    /// Column name of the last SET assignment, lowercased.
    pub set_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStmt {
    /// Explicit target tables of a multi-table delete.
    pub target_tables: Vec<TableRef>,
    /// Every table referenced by the FROM join tree, aliases preserved.
    pub tables: Vec<TableRef>,
}

/// Parsed statement, one arm per kind the engine distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    InceptionStart,
    InceptionCommit,
    InceptionShowVariables,
    InceptionSet { name: String, value: String },
    Show,
    Use { db: String },
    CreateDatabase { name: String, if_not_exists: bool },
    DropDatabase { name: String },
    CreateTable(CreateTableStmt),
    AlterTable(AlterTableStmt),
    DropTable { tables: Vec<TableRef>, if_exists: bool },
    RenameTable { old_table: TableRef, new_table: TableRef },
    TruncateTable { table: TableRef },
    CreateIndex { table: TableRef, name: String, unique: bool, columns: Vec<String> },
    DropIndex { table: TableRef, name: String },
    CreateView { name: String },
    Insert(InsertStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    Unsupported,
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::InceptionStart => StatementKind::InceptionStart,
            Statement::InceptionCommit => StatementKind::InceptionCommit,
            Statement::InceptionShowVariables => StatementKind::Show,
            Statement::InceptionSet { .. } => StatementKind::InceptionSet,
            Statement::Show => StatementKind::Show,
            Statement::Use { .. } => StatementKind::Use,
            Statement::CreateDatabase { .. } => StatementKind::CreateDatabase,
            Statement::DropDatabase { .. } => StatementKind::DropDatabase,
            Statement::CreateTable(_) => StatementKind::CreateTable,
            Statement::AlterTable(_) => StatementKind::AlterTable,
            Statement::DropTable { .. } => StatementKind::DropTable,
            Statement::RenameTable { .. } => StatementKind::RenameTable,
            Statement::TruncateTable { .. } => StatementKind::TruncateTable,
            Statement::CreateIndex { .. } => StatementKind::CreateIndex,
            Statement::DropIndex { .. } => StatementKind::DropIndex,
            Statement::CreateView { .. } => StatementKind::CreateView,
            Statement::Insert(_) => StatementKind::Insert,
            Statement::Update(_) => StatementKind::Update,
            Statement::Delete(_) => StatementKind::Delete,
            Statement::Unsupported => StatementKind::Unsupported,
        }
    }

    /// Whether the statement can only be processed with an open data source.
    /// Inception-scoped SHOW/SET work without one.
    pub fn needs_data_source(&self) -> bool {
        !matches!(
            self,
            Statement::InceptionShowVariables | Statement::InceptionSet { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_str_integers() {
        let t = FieldType::Int {
            width: None,
            unsigned: false,
        };
        assert_eq!(t.compact_str(), "int(11)");
        let t = FieldType::BigInt {
            width: None,
            unsigned: true,
        };
        assert_eq!(t.compact_str(), "bigint(20) unsigned");
        let t = FieldType::TinyInt {
            width: Some(1),
            unsigned: false,
        };
        assert_eq!(t.compact_str(), "tinyint(1)");
    }

    #[test]
    fn test_compact_str_strings_and_decimal() {
        assert_eq!(FieldType::Varchar { len: Some(10) }.compact_str(), "varchar(10)");
        assert_eq!(FieldType::Char { len: Some(5) }.compact_str(), "char(5)");
        assert_eq!(
            FieldType::Decimal {
                precision: Some(10),
                scale: Some(2),
                unsigned: false
            }
            .compact_str(),
            "decimal(10,2)"
        );
        assert_eq!(FieldType::Text.compact_str(), "text");
    }

    #[test]
    fn test_field_byte_length_known_prefixes() {
        assert_eq!(field_byte_length("tinyint(4)"), 1);
        assert_eq!(field_byte_length("int(11)"), 4);
        assert_eq!(field_byte_length("bigint(20)"), 8);
        assert_eq!(field_byte_length("datetime"), 8);
        assert_eq!(field_byte_length("timestamp"), 4);
    }

    #[test]
    fn test_field_byte_length_fallback_takes_first_digit() {
        // Parenthesized lengths outside the fixed table contribute only
        // their first digit, matching the live engine's estimator.
        assert_eq!(field_byte_length("varchar(10)"), 1);
        assert_eq!(field_byte_length("varchar(255)"), 2);
        assert_eq!(field_byte_length("char(9)"), 9);
        assert_eq!(field_byte_length("text"), 0);
    }

    #[test]
    fn test_to_field_info() {
        let mut col = ColumnDefinition::new("c", FieldType::Varchar { len: Some(10) });
        col.not_null = true;
        col.default_value = Some("x".to_string());
        col.comment = Some("y".to_string());
        let f = col.to_field_info();
        assert_eq!(f.field, "c");
        assert_eq!(f.field_type, "varchar(10)");
        assert_eq!(f.null, "NO");
        assert_eq!(f.default_value, "x");
        assert_eq!(f.comment, "y");
    }

    #[test]
    fn test_needs_data_source() {
        assert!(!Statement::InceptionShowVariables.needs_data_source());
        assert!(!Statement::InceptionSet {
            name: "x".into(),
            value: "1".into()
        }
        .needs_data_source());
        assert!(Statement::Show.needs_data_source());
        assert!(Statement::Unsupported.needs_data_source());
    }

    #[test]
    fn test_schema_or_falls_back_to_default() {
        let t = TableRef::new(None, "t1");
        assert_eq!(t.schema_or("db"), "db");
        let t = TableRef::new(Some("other".to_string()), "t1");
        assert_eq!(t.schema_or("db"), "other");
    }
}
