//! Rule engine: per-statement validators dispatched by statement kind.

mod alter_table;
mod database;
mod dml;
mod field;
mod index;
mod tables;

use crate::driver::{Connection, Connector};
use crate::session::Session;
use sqlgate_commons::errors::CheckCode;
use sqlgate_sql::ast::Statement;

impl<C: Connector> Session<C> {
    /// CHECK phase entry: route one parsed statement to its validator.
    pub(crate) fn check_statement(&mut self, statement: Statement, sql: &str) {
        match statement {
            Statement::Insert(insert) => self.check_insert(&insert),
            Statement::Update(update) => self.check_update(&update, sql),
            Statement::Delete(delete) => self.check_delete(&delete, sql),

            Statement::Use { db } => self.check_change_db(&db),
            Statement::CreateDatabase {
                name,
                if_not_exists,
            } => self.check_create_db(&name, if_not_exists),
            Statement::DropDatabase { name } => self.check_drop_db(&name),

            Statement::CreateTable(create) => self.check_create_table(&create),
            Statement::AlterTable(alter) => self.check_alter_table(&alter),
            Statement::DropTable { tables, if_exists } => {
                self.check_drop_table(&tables, if_exists)
            }
            Statement::RenameTable {
                old_table,
                new_table,
            } => self.check_rename_table(&old_table, &new_table),
            Statement::TruncateTable { table } => self.check_truncate_table(&table),

            Statement::CreateIndex {
                table,
                name,
                unique: _,
                columns,
            } => self.check_create_index_stmt(&table, &name, &columns),
            Statement::DropIndex { table, name } => self.check_drop_index_stmt(&table, &name),

            Statement::CreateView { name } => {
                self.append_error_message(&format!(
                    "Command is forbidden! Cannot create view '{}'.",
                    name
                ));
            }

            Statement::Show => self.check_show_passthrough(sql),
            Statement::InceptionSet { name, value } => self.check_inception_set(&name, &value),

            // markers are handled by the run loop
            Statement::InceptionStart
            | Statement::InceptionCommit
            | Statement::InceptionShowVariables => {}

            Statement::Unsupported => {
                log::info!("unmatched statement type: {}", sql);
                self.append_error_no(CheckCode::NotSupportedYet, &[]);
            }
        }
    }

    fn check_inception_set(&mut self, name: &str, value: &str) {
        if let Err(msg) = self.config.set_variable(name, value) {
            self.append_error_message(&msg);
        }
    }

    /// Run a SHOW statement against the target and fold its rows into the
    /// record's SQL text.
    fn check_show_passthrough(&mut self, sql: &str) {
        let result = match self.db.as_mut() {
            Some(db) => db.query(sql),
            None => return,
        };

        match result {
            Ok((_columns, rows)) => {
                let mut buf = String::from(sql);
                buf.push_str(":\n");
                for row in rows {
                    let line: Vec<String> = row
                        .into_iter()
                        .map(|v| v.unwrap_or_else(|| "NULL".to_string()))
                        .collect();
                    buf.push_str(&line.join(" | "));
                    buf.push('\n');
                }
                self.current.sql = buf.trim().to_string();
            }
            Err(err) => self.append_error_message(&err.message),
        }
    }
}
