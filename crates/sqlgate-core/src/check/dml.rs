//! INSERT / UPDATE / DELETE validation.

use crate::driver::Connector;
use crate::session::Session;
use sqlgate_commons::errors::CheckCode;
use sqlgate_sql::ast::{DeleteStmt, InsertStmt, UpdateStmt};

impl<C: Connector> Session<C> {
    pub(crate) fn check_insert(&mut self, insert: &InsertStmt) {
        log::debug!("INSERT");

        let mut field_count = insert.columns.len();
        if field_count == 0 {
            self.append_error_no(CheckCode::WithInsertField, &[]);
        }

        let table_id = insert
            .table
            .as_ref()
            .and_then(|table| self.table_from_cache(table, true));
        self.current.table = table_id;

        if let Some(id) = table_id {
            let (table_name, missing): (String, Vec<String>) = {
                let t = self.catalog.table(id);
                (
                    t.name.clone(),
                    insert
                        .columns
                        .iter()
                        .filter(|c| !t.has_field(c))
                        .cloned()
                        .collect(),
                )
            };
            for column in missing {
                self.append_error_no(
                    CheckCode::ColumnNotExisted,
                    &[&format!("{}.{}", table_name, column)],
                );
            }
        }

        if !insert.row_arities.is_empty() {
            if field_count == 0 {
                field_count = insert.row_arities[0];
            }
            for (i, arity) in insert.row_arities.iter().enumerate() {
                if *arity != field_count {
                    self.append_error_no(
                        CheckCode::WrongValueCountOnRow,
                        &[&(i + 1).to_string()],
                    );
                }
            }

            self.current.affected_rows = insert.row_arities.len() as u64;
        }

        if let Some(select) = &insert.select {
            let from_id = select
                .from
                .as_ref()
                .and_then(|from| self.table_from_cache(from, true));

            // arity check is skipped for a wildcard projection
            if field_count > 0 && !select.wildcard && select.field_count != field_count {
                self.append_error_no(CheckCode::WrongValueCountOnRow, &["1"]);
            }

            let from_new_cached = from_id
                .map(|id| self.catalog.table(id).new_cached)
                .unwrap_or(false);

            if select.from.is_none() || (from_id.is_some() && !from_new_cached) {
                let explain = format!("EXPLAIN {}", select.select_sql);
                self.explain_and_record(&explain);
            }
        }
    }

    pub(crate) fn check_update(&mut self, update: &UpdateStmt, sql: &str) {
        log::debug!("UPDATE");

        let mut catch_error = false;
        for table in &update.tables {
            match self.table_from_cache(table, true) {
                None => catch_error = true,
                Some(id) => {
                    if self.current.table.is_none() {
                        // Without a qualified SET column, find the table the
                        // assignment column belongs to.
                        if update.set_table.is_empty() {
                            if self.catalog.table(id).has_field(&update.set_column) {
                                self.current.table = Some(id);
                            }
                        } else if update.set_table == table.name.to_lowercase() {
                            self.current.table = Some(id);
                        }
                    }
                }
            }
        }

        if !catch_error {
            let explain = format!("EXPLAIN {}", sql);
            self.explain_and_record(&explain);
        }
    }

    pub(crate) fn check_delete(&mut self, delete: &DeleteStmt, sql: &str) {
        log::debug!("DELETE");

        for table in &delete.target_tables {
            self.current.table = self.table_from_cache(table, true);
        }

        for table in &delete.tables {
            let id = self.table_from_cache(table, true);
            if self.current.table.is_none() {
                self.current.table = id;
            }
        }

        let explain = format!("EXPLAIN {}", sql);
        self.explain_and_record(&explain);
    }
}
