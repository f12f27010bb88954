//! Statement classification and parsing.
//!
//! Classification works on the token stream (comments are skipped by the
//! tokenizer, so the marker statements classify correctly even with the
//! option comment attached); recognized SQL kinds then go through the full
//! `sqlparser` parse and are converted into [`crate::ast`] types.

mod ddl;
mod dml;

use crate::ast::{Statement, TableRef};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlparser::ast as sp;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer, Word};
use std::borrow::Cow;
use thiserror::Error;

/// Statement could not be parsed; carries the parser's message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// sqlparser has no MySQL `DROP INDEX` / `DROP FOREIGN KEY` alter operations;
// both are routed through DROP CONSTRAINT, with foreign keys tagged so the
// converter can tell them apart.
const FK_SENTINEL: &str = "__sqlgate_fk__";

static RE_ALTER_DROP_FK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bDROP\s+FOREIGN\s+KEY\s+").unwrap());
static RE_ALTER_DROP_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bDROP\s+(?:INDEX|KEY)\s+").unwrap());
// MySQL partitioning clauses are outside sqlparser's grammar; the clause is
// cut before parsing and detected separately from the raw text.
static RE_PARTITION_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\bPARTITION\s+BY\b.*").unwrap());

/// Classify and parse one statement into the engine's model.
pub fn parse_statement(sql: &str) -> Result<Statement, ParseError> {
    let dialect = MySqlDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|e| ParseError::new(e.to_string()))?;

    let words: Vec<String> = tokens
        .iter()
        .filter_map(|tok| match tok {
            Token::Word(w) => Some(w.value.to_uppercase()),
            _ => None,
        })
        .collect();
    let word_refs: Vec<&str> = words.iter().map(|s| s.as_str()).collect();

    match word_refs.as_slice() {
        [] => Ok(Statement::Unsupported),
        ["INCEPTION_MAGIC_START", ..] => Ok(Statement::InceptionStart),
        ["INCEPTION_MAGIC_COMMIT", ..] => Ok(Statement::InceptionCommit),
        ["INCEPTION", "SHOW", "VARIABLES", ..] => Ok(Statement::InceptionShowVariables),
        ["INCEPTION", "SET", ..] => parse_inception_set(&tokens),
        ["INCEPTION", ..] => Ok(Statement::Unsupported),
        ["SHOW", ..] => Ok(Statement::Show),
        ["DROP", "INDEX", ..] => parse_drop_index(&tokens),
        _ => parse_full(sql, &word_refs),
    }
}

/// `inception set <name> = <value>`
fn parse_inception_set(tokens: &[Token]) -> Result<Statement, ParseError> {
    let mut significant = tokens.iter().filter(|t| {
        !matches!(
            t,
            Token::Whitespace(_) | Token::SemiColon | Token::EOF | Token::Comma
        )
    });

    // skip INCEPTION SET
    significant.next();
    significant.next();

    let name = match significant.next() {
        Some(Token::Word(w)) => w.value.clone(),
        _ => return Err(ParseError::new("expected variable name after 'inception set'")),
    };

    match significant.next() {
        Some(Token::Eq) => {}
        _ => return Err(ParseError::new("expected '=' in 'inception set'")),
    }

    let value = match significant.next() {
        Some(Token::Word(w)) => w.value.clone(),
        Some(Token::SingleQuotedString(s)) | Some(Token::DoubleQuotedString(s)) => s.clone(),
        Some(Token::Number(n, _)) => n.clone(),
        Some(other) => other.to_string(),
        None => return Err(ParseError::new("expected value in 'inception set'")),
    };

    Ok(Statement::InceptionSet { name, value })
}

/// `DROP INDEX <name> ON [schema.]table`
fn parse_drop_index(tokens: &[Token]) -> Result<Statement, ParseError> {
    let words: Vec<&Word> = tokens
        .iter()
        .filter_map(|t| match t {
            Token::Word(w) => Some(w),
            _ => None,
        })
        .collect();

    if words.len() < 5 || !words[3].value.eq_ignore_ascii_case("on") {
        return Err(ParseError::new("malformed DROP INDEX statement"));
    }

    let name = words[2].value.clone();
    let table = if words.len() == 5 {
        TableRef::new(None, words[4].value.clone())
    } else {
        TableRef::new(Some(words[4].value.clone()), words[5].value.clone())
    };

    Ok(Statement::DropIndex { table, name })
}

fn parse_full(sql: &str, words: &[&str]) -> Result<Statement, ParseError> {
    let prepared: Cow<'_, str> = match words {
        ["ALTER", ..] => normalize_alter_sql(sql),
        ["CREATE", "TABLE", ..] | ["CREATE", "TEMPORARY", "TABLE", ..] => {
            RE_PARTITION_CLAUSE.replace(sql, "")
        }
        _ => Cow::Borrowed(sql),
    };

    let dialect = MySqlDialect {};
    let mut statements =
        Parser::parse_sql(&dialect, &prepared).map_err(|e| ParseError::new(e.to_string()))?;
    if statements.is_empty() {
        return Ok(Statement::Unsupported);
    }
    let statement = statements.remove(0);

    convert(statement, sql)
}

fn normalize_alter_sql(sql: &str) -> Cow<'_, str> {
    let replaced = RE_ALTER_DROP_FK.replace_all(sql, format!("DROP CONSTRAINT {}", FK_SENTINEL));
    match RE_ALTER_DROP_INDEX.replace_all(&replaced, "DROP CONSTRAINT ") {
        Cow::Borrowed(_) => replaced.clone().into_owned().into(),
        Cow::Owned(s) => Cow::Owned(s),
    }
}

fn convert(statement: sp::Statement, raw: &str) -> Result<Statement, ParseError> {
    match statement {
        sp::Statement::CreateTable(ct) => ddl::convert_create_table(ct, raw),
        sp::Statement::AlterTable {
            name, operations, ..
        } => ddl::convert_alter_table(&name, operations),
        sp::Statement::Drop {
            object_type,
            if_exists,
            names,
            ..
        } => ddl::convert_drop(object_type, if_exists, &names),
        sp::Statement::Truncate { table_names, .. } => ddl::convert_truncate(&table_names),
        sp::Statement::RenameTable(renames) => ddl::convert_rename(&renames),
        sp::Statement::CreateIndex(ci) => ddl::convert_create_index(ci),
        sp::Statement::CreateDatabase {
            db_name,
            if_not_exists,
            ..
        } => Ok(Statement::CreateDatabase {
            name: last_part(&db_name),
            if_not_exists,
        }),
        sp::Statement::CreateView { name, .. } => Ok(Statement::CreateView {
            name: last_part(&name),
        }),
        sp::Statement::Use(u) => convert_use(u),
        sp::Statement::Insert(ins) => dml::convert_insert(ins, raw),
        sp::Statement::Update {
            table, assignments, ..
        } => dml::convert_update(&table, &assignments),
        sp::Statement::Delete(del) => dml::convert_delete(&del),
        _ => Ok(Statement::Unsupported),
    }
}

fn convert_use(u: sp::Use) -> Result<Statement, ParseError> {
    match u {
        sp::Use::Object(name) | sp::Use::Database(name) | sp::Use::Schema(name) => {
            Ok(Statement::Use {
                db: last_part(&name),
            })
        }
        _ => Ok(Statement::Unsupported),
    }
}

// ---- shared helpers for the converters ----

pub(crate) fn object_name_parts(name: &sp::ObjectName) -> Vec<String> {
    name.0
        .iter()
        .map(|part| match part {
            sp::ObjectNamePart::Identifier(id) => id.value.clone(),
            other => other.to_string(),
        })
        .collect()
}

pub(crate) fn last_part(name: &sp::ObjectName) -> String {
    object_name_parts(name).pop().unwrap_or_default()
}

pub(crate) fn table_ref(name: &sp::ObjectName) -> TableRef {
    let parts = object_name_parts(name);
    match parts.len() {
        0 => TableRef::default(),
        1 => TableRef::new(None, parts.into_iter().next().unwrap()),
        _ => {
            let schema = parts[0].clone();
            let table = parts.last().unwrap().clone();
            TableRef::new(Some(schema), table)
        }
    }
}

pub(crate) fn value_to_string(value: &sp::Value) -> String {
    match value {
        sp::Value::SingleQuotedString(s) | sp::Value::DoubleQuotedString(s) => s.clone(),
        sp::Value::Number(n, _) => n.clone(),
        sp::Value::Boolean(b) => b.to_string(),
        sp::Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn expr_to_string(expr: &sp::Expr) -> String {
    match expr {
        sp::Expr::Value(v) => value_to_string(&v.value),
        sp::Expr::Identifier(id) => id.value.clone(),
        other => other.to_string(),
    }
}

/// Column names out of an index column list; plain identifiers only, complex
/// key part expressions fall back to their rendered text.
pub(crate) fn index_column_names(columns: &[sp::IndexColumn]) -> Vec<String> {
    columns
        .iter()
        .map(|c| match &c.column.expr {
            sp::Expr::Identifier(id) => id.value.clone(),
            other => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AlterSpec, Statement};

    #[test]
    fn test_classify_markers() {
        assert_eq!(
            parse_statement("inception_magic_start").unwrap(),
            Statement::InceptionStart
        );
        assert_eq!(
            parse_statement("inception_magic_commit").unwrap(),
            Statement::InceptionCommit
        );
        // option comment attached to the begin marker is skipped by the tokenizer
        assert_eq!(
            parse_statement("/*--user=x;--password=y;*/\ninception_magic_start").unwrap(),
            Statement::InceptionStart
        );
    }

    #[test]
    fn test_classify_inception_scoped() {
        assert_eq!(
            parse_statement("inception show variables").unwrap(),
            Statement::InceptionShowVariables
        );
        assert_eq!(
            parse_statement("inception set enable_drop_table = true").unwrap(),
            Statement::InceptionSet {
                name: "enable_drop_table".to_string(),
                value: "true".to_string()
            }
        );
        assert_eq!(
            parse_statement("inception set max_keys = 32").unwrap(),
            Statement::InceptionSet {
                name: "max_keys".to_string(),
                value: "32".to_string()
            }
        );
    }

    #[test]
    fn test_classify_show_passthrough() {
        assert_eq!(
            parse_statement("SHOW VARIABLES LIKE 'version'").unwrap(),
            Statement::Show
        );
    }

    #[test]
    fn test_parse_drop_index_standalone() {
        let stmt = parse_statement("DROP INDEX ix_a ON db1.t1").unwrap();
        assert_eq!(
            stmt,
            Statement::DropIndex {
                table: TableRef::new(Some("db1".to_string()), "t1"),
                name: "ix_a".to_string()
            }
        );
    }

    #[test]
    fn test_parse_use() {
        assert_eq!(
            parse_statement("USE db1").unwrap(),
            Statement::Use {
                db: "db1".to_string()
            }
        );
    }

    #[test]
    fn test_parse_create_database() {
        assert_eq!(
            parse_statement("CREATE DATABASE IF NOT EXISTS db1").unwrap(),
            Statement::CreateDatabase {
                name: "db1".to_string(),
                if_not_exists: true
            }
        );
        assert_eq!(
            parse_statement("DROP DATABASE db1").unwrap(),
            Statement::DropDatabase {
                name: "db1".to_string()
            }
        );
    }

    #[test]
    fn test_alter_drop_index_normalization() {
        let stmt = parse_statement("ALTER TABLE t1 DROP INDEX ix_a").unwrap();
        match stmt {
            Statement::AlterTable(alter) => {
                assert_eq!(
                    alter.specs,
                    vec![AlterSpec::DropIndex {
                        name: "ix_a".to_string()
                    }]
                );
            }
            other => panic!("expected ALTER TABLE, got {:?}", other),
        }
    }

    #[test]
    fn test_alter_drop_foreign_key_is_tagged() {
        let stmt = parse_statement("ALTER TABLE t1 DROP FOREIGN KEY fk_user").unwrap();
        match stmt {
            Statement::AlterTable(alter) => {
                assert_eq!(
                    alter.specs,
                    vec![AlterSpec::DropForeignKey {
                        name: "fk_user".to_string()
                    }]
                );
            }
            other => panic!("expected ALTER TABLE, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_statement_is_error() {
        assert!(parse_statement("CREATE TABLE ((((").is_err());
    }

    #[test]
    fn test_select_is_unsupported_kind() {
        assert_eq!(parse_statement("SELECT 1").unwrap(), Statement::Unsupported);
    }
}
