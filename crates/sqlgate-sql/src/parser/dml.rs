//! DML statement conversion: sqlparser AST -> engine statement model.

use super::{table_ref, ParseError};
use crate::ast::{DeleteStmt, InsertSelect, InsertStmt, Statement, TableRef, UpdateStmt};
use sqlparser::ast as sp;

pub(super) fn convert_insert(ins: sp::Insert, raw: &str) -> Result<Statement, ParseError> {
    let table = match &ins.table {
        sp::TableObject::TableName(name) => Some(table_ref(name)),
        _ => None,
    };

    let columns: Vec<String> = ins.columns.iter().map(|c| c.value.clone()).collect();

    let mut row_arities = Vec::new();
    let mut select = None;

    if let Some(source) = &ins.source {
        match source.body.as_ref() {
            sp::SetExpr::Values(values) => {
                row_arities = values.rows.iter().map(|row| row.len()).collect();
            }
            sp::SetExpr::Select(sel) => {
                select = Some(convert_insert_select(sel, raw));
            }
            _ => {}
        }
    }

    Ok(Statement::Insert(InsertStmt {
        table,
        columns,
        row_arities,
        select,
        has_set_list: !ins.assignments.is_empty(),
    }))
}

fn convert_insert_select(sel: &sp::Select, raw: &str) -> InsertSelect {
    let from = single_plain_table(&sel.from);

    let wildcard = matches!(
        sel.projection.first(),
        Some(sp::SelectItem::Wildcard(_)) | Some(sp::SelectItem::QualifiedWildcard(..))
    );

    let select_sql = match raw.to_lowercase().find("select") {
        Some(pos) => raw[pos..].to_string(),
        None => raw.to_string(),
    };

    InsertSelect {
        from,
        field_count: sel.projection.len(),
        wildcard,
        select_sql,
    }
}

/// The FROM clause reduced to one plain, unaliased table, or None.
fn single_plain_table(from: &[sp::TableWithJoins]) -> Option<TableRef> {
    let [twj] = from else {
        return None;
    };
    if !twj.joins.is_empty() {
        return None;
    }
    match &twj.relation {
        sp::TableFactor::Table {
            name,
            alias: None,
            ..
        } => Some(table_ref(name)),
        _ => None,
    }
}

pub(super) fn convert_update(
    table: &sp::TableWithJoins,
    assignments: &[sp::Assignment],
) -> Result<Statement, ParseError> {
    let mut tables = Vec::new();
    extract_tables(table, &mut tables);

    // The original walks the whole SET list, so the last assignment wins.
    let mut set_table = String::new();
    let mut set_column = String::new();
    for assignment in assignments {
        if let sp::AssignmentTarget::ColumnName(name) = &assignment.target {
            let parts = super::object_name_parts(name);
            if let Some(column) = parts.last() {
                set_column = column.to_lowercase();
            }
            set_table = if parts.len() >= 2 {
                parts[parts.len() - 2].to_lowercase()
            } else {
                String::new()
            };
        }
    }

    Ok(Statement::Update(UpdateStmt {
        tables,
        set_table,
        set_column,
    }))
}

pub(super) fn convert_delete(del: &sp::Delete) -> Result<Statement, ParseError> {
    let target_tables: Vec<TableRef> = del.tables.iter().map(table_ref).collect();

    let from = match &del.from {
        sp::FromTable::WithFromKeyword(v) | sp::FromTable::WithoutKeyword(v) => v,
    };

    let mut tables = Vec::new();
    for twj in from {
        extract_tables(twj, &mut tables);
    }

    Ok(Statement::Delete(DeleteStmt {
        target_tables,
        tables,
    }))
}

/// Recursive walk of a join tree, collecting every referenced table. An
/// aliased reference keeps its schema but takes the alias as its name, so
/// later resolution sees the name the statement actually uses.
fn extract_tables(twj: &sp::TableWithJoins, out: &mut Vec<TableRef>) {
    extract_factor(&twj.relation, out);
    for join in &twj.joins {
        extract_factor(&join.relation, out);
    }
}

fn extract_factor(factor: &sp::TableFactor, out: &mut Vec<TableRef>) {
    match factor {
        sp::TableFactor::Table { name, alias, .. } => {
            let mut table = table_ref(name);
            if let Some(alias) = alias {
                table.name = alias.name.value.clone();
            }
            out.push(table);
        }
        sp::TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            extract_tables(table_with_joins, out);
        }
        _ => {}
    }
}
