//! DDL statement conversion: sqlparser AST -> engine statement model.

use super::{
    expr_to_string, index_column_names, last_part, object_name_parts, table_ref, value_to_string,
    ParseError, FK_SENTINEL,
};
use crate::ast::{
    AlterSpec, AlterTableStmt, ColumnDefinition, ColumnPosition, CreateTableStmt, FieldType,
    Statement, TableConstraintDef, TableOptions,
};
use sqlparser::ast as sp;
use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

pub(super) fn convert_create_table(
    ct: sp::CreateTable,
    raw: &str,
) -> Result<Statement, ParseError> {
    let table = table_ref(&ct.name);
    let like = ct.like.as_ref().map(table_ref);

    let columns: Vec<ColumnDefinition> = ct.columns.iter().map(convert_column_def).collect();

    let mut constraints = Vec::new();
    for constraint in &ct.constraints {
        match constraint {
            sp::TableConstraint::PrimaryKey { columns, .. } => {
                constraints.push(TableConstraintDef::PrimaryKey {
                    columns: index_column_names(columns),
                });
            }
            sp::TableConstraint::Unique {
                name,
                index_name,
                columns,
                ..
            } => {
                constraints.push(TableConstraintDef::Unique {
                    name: constraint_name(name, index_name),
                    columns: index_column_names(columns),
                });
            }
            sp::TableConstraint::Index { name, columns, .. } => {
                constraints.push(TableConstraintDef::Index {
                    name: name.as_ref().map(|i| i.value.clone()).unwrap_or_default(),
                    columns: index_column_names(columns),
                });
            }
            _ => {}
        }
    }

    let (options, has_partition) = scan_table_options(raw);

    Ok(Statement::CreateTable(CreateTableStmt {
        table,
        if_not_exists: ct.if_not_exists,
        like,
        columns,
        constraints,
        options,
        has_partition,
    }))
}

fn constraint_name(name: &Option<sp::Ident>, index_name: &Option<sp::Ident>) -> String {
    name.as_ref()
        .or(index_name.as_ref())
        .map(|i| i.value.clone())
        .unwrap_or_default()
}

/// Scan the raw CREATE TABLE text for trailing table options and a PARTITION
/// clause. Runs over the token stream at paren depth zero, after the column
/// list closes, so column-level COMMENT options are never confused with the
/// table-level one.
fn scan_table_options(raw: &str) -> (TableOptions, bool) {
    let mut options = TableOptions::default();
    let mut has_partition = false;

    let dialect = MySqlDialect {};
    let tokens = match Tokenizer::new(&dialect, raw).tokenize() {
        Ok(t) => t,
        Err(_) => return (options, has_partition),
    };

    let significant: Vec<&Token> = tokens
        .iter()
        .filter(|t| !matches!(t, Token::Whitespace(_)))
        .collect();

    let mut depth: i32 = 0;
    let mut columns_closed = false;
    let mut idx = 0;

    let option_value = |tokens: &[&Token], mut i: usize| -> (Option<String>, usize) {
        if matches!(tokens.get(i), Some(Token::Eq)) {
            i += 1;
        }
        match tokens.get(i) {
            Some(Token::Word(w)) => (Some(w.value.clone()), i + 1),
            Some(Token::SingleQuotedString(s)) | Some(Token::DoubleQuotedString(s)) => {
                (Some(s.clone()), i + 1)
            }
            Some(Token::Number(n, _)) => (Some(n.clone()), i + 1),
            _ => (None, i),
        }
    };

    while idx < significant.len() {
        match significant[idx] {
            Token::LParen => {
                depth += 1;
                idx += 1;
            }
            Token::RParen => {
                depth -= 1;
                if depth == 0 {
                    columns_closed = true;
                }
                idx += 1;
            }
            Token::Word(w) if depth == 0 && columns_closed => {
                let upper = w.value.to_uppercase();
                match upper.as_str() {
                    "ENGINE" => {
                        let (value, next) = option_value(&significant, idx + 1);
                        options.engine = value;
                        idx = next;
                    }
                    "CHARSET" => {
                        let (value, next) = option_value(&significant, idx + 1);
                        options.charset = value;
                        idx = next;
                    }
                    "CHARACTER" => {
                        // CHARACTER SET utf8
                        if let Some(Token::Word(set)) = significant.get(idx + 1) {
                            if set.value.eq_ignore_ascii_case("set") {
                                let (value, next) = option_value(&significant, idx + 2);
                                options.charset = value;
                                idx = next;
                                continue;
                            }
                        }
                        idx += 1;
                    }
                    "COLLATE" => {
                        let (value, next) = option_value(&significant, idx + 1);
                        options.collation = value;
                        idx = next;
                    }
                    "COMMENT" => {
                        let (value, next) = option_value(&significant, idx + 1);
                        options.comment = value;
                        idx = next;
                    }
                    "PARTITION" => {
                        if let Some(Token::Word(by)) = significant.get(idx + 1) {
                            if by.value.eq_ignore_ascii_case("by") {
                                has_partition = true;
                            }
                        }
                        idx += 1;
                    }
                    _ => idx += 1,
                }
            }
            _ => {
                idx += 1;
            }
        }
    }

    (options, has_partition)
}

pub(super) fn convert_alter_table(
    name: &sp::ObjectName,
    operations: Vec<sp::AlterTableOperation>,
) -> Result<Statement, ParseError> {
    let table = table_ref(name);
    let mut specs = Vec::new();

    for op in operations {
        let spec = match op {
            sp::AlterTableOperation::AddColumn {
                column_def,
                column_position,
                ..
            } => AlterSpec::AddColumn {
                columns: vec![convert_column_def(&column_def)],
                position: convert_position(column_position),
            },
            sp::AlterTableOperation::DropColumn { column_names, .. } => AlterSpec::DropColumn {
                name: column_names[0].value.clone(),
            },
            sp::AlterTableOperation::ModifyColumn {
                col_name,
                data_type,
                options,
                column_position,
                ..
            } => {
                let mut column = ColumnDefinition::new(col_name.value.clone(), convert_data_type(&data_type));
                for option in &options {
                    apply_column_option(&mut column, option);
                }
                AlterSpec::ModifyColumn {
                    column,
                    position: convert_position(column_position),
                }
            }
            sp::AlterTableOperation::ChangeColumn {
                old_name,
                new_name,
                data_type,
                options,
                column_position,
                ..
            } => {
                let mut column = ColumnDefinition::new(new_name.value.clone(), convert_data_type(&data_type));
                for option in &options {
                    apply_column_option(&mut column, option);
                }
                AlterSpec::ChangeColumn {
                    old_name: old_name.value.clone(),
                    column,
                    position: convert_position(column_position),
                }
            }
            sp::AlterTableOperation::AddConstraint { constraint, .. } => {
                convert_add_constraint(constraint)
            }
            sp::AlterTableOperation::DropPrimaryKey => AlterSpec::DropPrimaryKey,
            sp::AlterTableOperation::DropConstraint { name, .. } => {
                let ident = name.value.clone();
                match ident.strip_prefix(FK_SENTINEL) {
                    Some(fk) => AlterSpec::DropForeignKey {
                        name: fk.to_string(),
                    },
                    None => AlterSpec::DropIndex { name: ident },
                }
            }
            sp::AlterTableOperation::RenameTable { table_name } => AlterSpec::RenameTable {
                new_table: table_ref(&table_name),
            },
            _ => AlterSpec::Unsupported,
        };
        specs.push(spec);
    }

    Ok(Statement::AlterTable(AlterTableStmt { table, specs }))
}

fn convert_add_constraint(constraint: sp::TableConstraint) -> AlterSpec {
    match constraint {
        sp::TableConstraint::PrimaryKey { columns, .. } => AlterSpec::AddPrimaryKey {
            columns: index_column_names(&columns),
        },
        sp::TableConstraint::Unique {
            name,
            index_name,
            columns,
            ..
        } => AlterSpec::AddIndex {
            name: constraint_name(&name, &index_name),
            unique: true,
            columns: index_column_names(&columns),
        },
        sp::TableConstraint::Index { name, columns, .. } => AlterSpec::AddIndex {
            name: name.as_ref().map(|i| i.value.clone()).unwrap_or_default(),
            unique: false,
            columns: index_column_names(&columns),
        },
        _ => AlterSpec::Unsupported,
    }
}

fn convert_position(position: Option<sp::MySQLColumnPosition>) -> Option<ColumnPosition> {
    position.map(|p| match p {
        sp::MySQLColumnPosition::First => ColumnPosition::First,
        sp::MySQLColumnPosition::After(id) => ColumnPosition::After(id.value.clone()),
    })
}

pub(super) fn convert_drop(
    object_type: sp::ObjectType,
    if_exists: bool,
    names: &[sp::ObjectName],
) -> Result<Statement, ParseError> {
    match object_type {
        sp::ObjectType::Table => Ok(Statement::DropTable {
            tables: names.iter().map(table_ref).collect(),
            if_exists,
        }),
        sp::ObjectType::Database | sp::ObjectType::Schema => {
            let name = names.first().map(last_part).unwrap_or_default();
            Ok(Statement::DropDatabase { name })
        }
        _ => Ok(Statement::Unsupported),
    }
}

pub(super) fn convert_truncate(
    table_names: &[sp::TruncateTableTarget],
) -> Result<Statement, ParseError> {
    let table = table_names
        .first()
        .map(|t| table_ref(&t.name))
        .unwrap_or_default();
    Ok(Statement::TruncateTable { table })
}

pub(super) fn convert_rename(renames: &[sp::RenameTable]) -> Result<Statement, ParseError> {
    let Some(first) = renames.first() else {
        return Ok(Statement::Unsupported);
    };
    Ok(Statement::RenameTable {
        old_table: table_ref(&first.old_name),
        new_table: table_ref(&first.new_name),
    })
}

pub(super) fn convert_create_index(ci: sp::CreateIndex) -> Result<Statement, ParseError> {
    let name = ci
        .name
        .as_ref()
        .map(|n| object_name_parts(n).pop().unwrap_or_default())
        .unwrap_or_default();
    Ok(Statement::CreateIndex {
        table: table_ref(&ci.table_name),
        name,
        unique: ci.unique,
        columns: index_column_names(&ci.columns),
    })
}

pub(super) fn convert_column_def(def: &sp::ColumnDef) -> ColumnDefinition {
    let mut column = ColumnDefinition::new(def.name.value.clone(), convert_data_type(&def.data_type));
    for option in &def.options {
        apply_column_option(&mut column, &option.option);
    }
    column
}

fn apply_column_option(column: &mut ColumnDefinition, option: &sp::ColumnOption) {
    match option {
        sp::ColumnOption::NotNull => column.not_null = true,
        sp::ColumnOption::Null => column.not_null = false,
        sp::ColumnOption::Default(expr) => {
            column.default_value = default_from_expr(expr);
        }
        sp::ColumnOption::Unique { is_primary, .. } => {
            if *is_primary {
                column.primary_key = true;
            } else {
                column.unique = true;
            }
        }
        sp::ColumnOption::Comment(comment) => {
            if !comment.is_empty() {
                column.comment = Some(comment.clone());
            }
        }
        sp::ColumnOption::CharacterSet(name) => {
            column.charset = Some(object_name_parts(name).join("."));
        }
        sp::ColumnOption::Collation(name) => {
            column.collation = Some(object_name_parts(name).join("."));
        }
        sp::ColumnOption::DialectSpecific(tokens) => {
            let joined = tokens
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(" ")
                .to_uppercase();
            if joined.contains("AUTO_INCREMENT") {
                column.auto_increment = true;
            }
        }
        _ => {}
    }
}

fn default_from_expr(expr: &sp::Expr) -> Option<String> {
    match expr {
        sp::Expr::Value(v) if matches!(v.value, sp::Value::Null) => None,
        sp::Expr::Value(v) => Some(value_to_string(&v.value)),
        other => Some(expr_to_string(other)),
    }
}

fn char_len(length: &Option<sp::CharacterLength>) -> Option<u64> {
    match length {
        Some(sp::CharacterLength::IntegerLength { length, .. }) => Some(*length),
        _ => None,
    }
}

fn binary_len(length: &Option<sp::BinaryLength>) -> Option<u64> {
    match length {
        Some(sp::BinaryLength::IntegerLength { length }) => Some(*length),
        _ => None,
    }
}

fn decimal_info(info: &sp::ExactNumberInfo) -> (Option<u64>, Option<u64>) {
    match info {
        sp::ExactNumberInfo::PrecisionAndScale(p, s) => (Some(*p), Some(*s)),
        sp::ExactNumberInfo::Precision(p) => (Some(*p), None),
        sp::ExactNumberInfo::None => (None, None),
    }
}

pub(super) fn convert_data_type(data_type: &sp::DataType) -> FieldType {
    match data_type {
        sp::DataType::TinyInt(w) => FieldType::TinyInt {
            width: *w,
            unsigned: false,
        },
        sp::DataType::TinyIntUnsigned(w) => FieldType::TinyInt {
            width: *w,
            unsigned: true,
        },
        sp::DataType::SmallInt(w) => FieldType::SmallInt {
            width: *w,
            unsigned: false,
        },
        sp::DataType::SmallIntUnsigned(w) => FieldType::SmallInt {
            width: *w,
            unsigned: true,
        },
        sp::DataType::MediumInt(w) => FieldType::MediumInt {
            width: *w,
            unsigned: false,
        },
        sp::DataType::MediumIntUnsigned(w) => FieldType::MediumInt {
            width: *w,
            unsigned: true,
        },
        sp::DataType::Int(w) | sp::DataType::Integer(w) => FieldType::Int {
            width: *w,
            unsigned: false,
        },
        sp::DataType::IntUnsigned(w) | sp::DataType::IntegerUnsigned(w) => FieldType::Int {
            width: *w,
            unsigned: true,
        },
        sp::DataType::BigInt(w) => FieldType::BigInt {
            width: *w,
            unsigned: false,
        },
        sp::DataType::BigIntUnsigned(w) => FieldType::BigInt {
            width: *w,
            unsigned: true,
        },
        sp::DataType::Decimal(info) | sp::DataType::Numeric(info) => {
            let (precision, scale) = decimal_info(info);
            FieldType::Decimal {
                precision,
                scale,
                unsigned: false,
            }
        }
        sp::DataType::Float(_) | sp::DataType::Real => FieldType::Float,
        sp::DataType::Double(_) | sp::DataType::DoublePrecision => FieldType::Double,
        sp::DataType::Char(l) | sp::DataType::Character(l) => FieldType::Char { len: char_len(l) },
        sp::DataType::Varchar(l) | sp::DataType::CharacterVarying(l) => FieldType::Varchar {
            len: char_len(l),
        },
        sp::DataType::TinyText => FieldType::TinyText,
        sp::DataType::Text => FieldType::Text,
        sp::DataType::MediumText => FieldType::MediumText,
        sp::DataType::LongText => FieldType::LongText,
        sp::DataType::TinyBlob => FieldType::TinyBlob,
        sp::DataType::Blob(_) => FieldType::Blob,
        sp::DataType::MediumBlob => FieldType::MediumBlob,
        sp::DataType::LongBlob => FieldType::LongBlob,
        sp::DataType::Binary(l) => FieldType::Binary { len: *l },
        sp::DataType::Varbinary(l) => FieldType::Varbinary { len: binary_len(l) },
        sp::DataType::Enum(members, _) => FieldType::Enum(
            members
                .iter()
                .map(|m| match m {
                    sp::EnumMember::Name(n) => n.clone(),
                    sp::EnumMember::NamedValue(n, _) => n.clone(),
                })
                .collect(),
        ),
        sp::DataType::Set(values) => FieldType::Set(values.clone()),
        sp::DataType::Bit(l) => FieldType::Bit { len: *l },
        sp::DataType::Date => FieldType::Date,
        sp::DataType::Datetime(fsp) => FieldType::DateTime { fsp: *fsp },
        sp::DataType::Timestamp(fsp, _) => FieldType::Timestamp { fsp: *fsp },
        sp::DataType::Time(fsp, _) => FieldType::Time { fsp: *fsp },
        sp::DataType::JSON => FieldType::Json,
        other => FieldType::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_statement;
    use crate::ast::{AlterSpec, ColumnPosition, FieldType, Statement};

    fn create_table(sql: &str) -> crate::ast::CreateTableStmt {
        match parse_statement(sql).unwrap() {
            Statement::CreateTable(ct) => ct,
            other => panic!("expected CREATE TABLE, got {:?}", other),
        }
    }

    fn alter_table(sql: &str) -> crate::ast::AlterTableStmt {
        match parse_statement(sql).unwrap() {
            Statement::AlterTable(at) => at,
            other => panic!("expected ALTER TABLE, got {:?}", other),
        }
    }

    #[test]
    fn test_create_table_columns_and_options() {
        let ct = create_table(
            "CREATE TABLE db1.t1 (id INT PRIMARY KEY COMMENT 'pk', name VARCHAR(32) NOT NULL DEFAULT 'x' COMMENT 'n') ENGINE=INNODB COMMENT='people'",
        );
        assert_eq!(ct.table.name, "t1");
        assert_eq!(ct.table.schema.as_deref(), Some("db1"));
        assert_eq!(ct.columns.len(), 2);

        let id = &ct.columns[0];
        assert!(id.primary_key);
        assert_eq!(id.field_type, FieldType::Int { width: None, unsigned: false });

        let name = &ct.columns[1];
        assert!(name.not_null);
        assert_eq!(name.default_value.as_deref(), Some("x"));
        assert_eq!(name.comment.as_deref(), Some("n"));

        assert_eq!(ct.options.engine.as_deref(), Some("INNODB"));
        assert_eq!(ct.options.comment.as_deref(), Some("people"));
        assert!(ct.options.charset.is_none());
        assert!(!ct.has_partition);
    }

    #[test]
    fn test_create_table_charset_option_detected() {
        let ct = create_table(
            "CREATE TABLE t1 (id INT PRIMARY KEY) ENGINE=innodb DEFAULT CHARSET=utf8mb4",
        );
        assert_eq!(ct.options.charset.as_deref(), Some("utf8mb4"));
    }

    #[test]
    fn test_create_table_primary_key_constraint() {
        let ct = create_table("CREATE TABLE t1 (a INT, b INT, PRIMARY KEY (a, b)) ENGINE=innodb");
        assert_eq!(ct.constraints.len(), 1);
        match &ct.constraints[0] {
            crate::ast::TableConstraintDef::PrimaryKey { columns } => {
                assert_eq!(columns, &vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected primary key, got {:?}", other),
        }
    }

    #[test]
    fn test_create_table_like() {
        let ct = create_table("CREATE TABLE t2 LIKE db1.t1");
        assert!(ct.like.is_some());
        assert_eq!(ct.like.as_ref().unwrap().name, "t1");
    }

    #[test]
    fn test_create_table_auto_increment_flag() {
        let ct = create_table("CREATE TABLE t1 (id INT UNSIGNED AUTO_INCREMENT PRIMARY KEY) ENGINE=innodb");
        assert!(ct.columns[0].auto_increment);
        assert!(ct.columns[0].field_type.is_unsigned());
    }

    #[test]
    fn test_alter_add_column_with_position() {
        let at = alter_table("ALTER TABLE t1 ADD COLUMN c INT COMMENT 'y' AFTER b");
        assert_eq!(at.specs.len(), 1);
        match &at.specs[0] {
            AlterSpec::AddColumn { columns, position } => {
                assert_eq!(columns[0].name, "c");
                assert_eq!(columns[0].comment.as_deref(), Some("y"));
                assert_eq!(position, &Some(ColumnPosition::After("b".to_string())));
            }
            other => panic!("expected ADD COLUMN, got {:?}", other),
        }
    }

    #[test]
    fn test_alter_drop_and_change_column() {
        let at = alter_table("ALTER TABLE t1 DROP COLUMN a, CHANGE COLUMN b b2 VARCHAR(20) NOT NULL");
        assert_eq!(at.specs.len(), 2);
        assert_eq!(
            at.specs[0],
            AlterSpec::DropColumn {
                name: "a".to_string()
            }
        );
        match &at.specs[1] {
            AlterSpec::ChangeColumn { old_name, column, .. } => {
                assert_eq!(old_name, "b");
                assert_eq!(column.name, "b2");
                assert!(column.not_null);
            }
            other => panic!("expected CHANGE COLUMN, got {:?}", other),
        }
    }

    #[test]
    fn test_alter_add_index_forms() {
        let at = alter_table("ALTER TABLE t1 ADD INDEX ix_a (a), ADD UNIQUE INDEX ux_b (b), ADD PRIMARY KEY (id)");
        assert_eq!(
            at.specs[0],
            AlterSpec::AddIndex {
                name: "ix_a".to_string(),
                unique: false,
                columns: vec!["a".to_string()]
            }
        );
        match &at.specs[1] {
            AlterSpec::AddIndex { name, unique, columns } => {
                assert_eq!(name, "ux_b");
                assert!(*unique);
                assert_eq!(columns, &vec!["b".to_string()]);
            }
            other => panic!("expected unique index, got {:?}", other),
        }
        assert_eq!(
            at.specs[2],
            AlterSpec::AddPrimaryKey {
                columns: vec!["id".to_string()]
            }
        );
    }

    #[test]
    fn test_alter_rename_table() {
        let at = alter_table("ALTER TABLE t1 RENAME TO t2");
        assert_eq!(
            at.specs,
            vec![AlterSpec::RenameTable {
                new_table: crate::ast::TableRef::new(None, "t2")
            }]
        );
    }

    #[test]
    fn test_drop_table_if_exists() {
        match parse_statement("DROP TABLE IF EXISTS db1.t1, t2").unwrap() {
            Statement::DropTable { tables, if_exists } => {
                assert!(if_exists);
                assert_eq!(tables.len(), 2);
                assert_eq!(tables[0].name, "t1");
                assert_eq!(tables[1].name, "t2");
            }
            other => panic!("expected DROP TABLE, got {:?}", other),
        }
    }

    #[test]
    fn test_truncate_and_rename() {
        match parse_statement("TRUNCATE TABLE db1.t1").unwrap() {
            Statement::TruncateTable { table } => assert_eq!(table.name, "t1"),
            other => panic!("expected TRUNCATE, got {:?}", other),
        }
        match parse_statement("RENAME TABLE t1 TO t2").unwrap() {
            Statement::RenameTable {
                old_table,
                new_table,
            } => {
                assert_eq!(old_table.name, "t1");
                assert_eq!(new_table.name, "t2");
            }
            other => panic!("expected RENAME TABLE, got {:?}", other),
        }
    }

    #[test]
    fn test_create_index() {
        match parse_statement("CREATE UNIQUE INDEX ux_a ON db1.t1 (a, b)").unwrap() {
            Statement::CreateIndex {
                table,
                name,
                unique,
                columns,
            } => {
                assert_eq!(table.name, "t1");
                assert_eq!(name, "ux_a");
                assert!(unique);
                assert_eq!(columns, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected CREATE INDEX, got {:?}", other),
        }
    }

    #[test]
    fn test_enum_column_type() {
        let ct = create_table("CREATE TABLE t1 (s ENUM('a','b') , id INT PRIMARY KEY) ENGINE=innodb");
        match &ct.columns[0].field_type {
            FieldType::Enum(values) => assert_eq!(values, &vec!["a".to_string(), "b".to_string()]),
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_partition_clause_detected() {
        let ct = create_table(
            "CREATE TABLE t1 (id INT PRIMARY KEY) ENGINE=innodb PARTITION BY HASH (id) PARTITIONS 4",
        );
        assert!(ct.has_partition);
    }
}
