//! Index creation and deletion validation, shared between ALTER TABLE specs
//! and the standalone CREATE INDEX / DROP INDEX statements.

use crate::driver::{Connection, Connector};
use crate::rollback::RollbackBuffer;
use crate::session::Session;
use sqlgate_commons::constants::MAX_KEY_LENGTH;
use sqlgate_commons::errors::CheckCode;
use sqlgate_commons::models::{IndexInfo, TableId};
use sqlgate_sql::ast::{field_byte_length, TableRef};

impl<C: Connector> Session<C> {
    /// Vet one new index and contribute its rollback fragment.
    pub(crate) fn check_create_index(
        &mut self,
        id: TableId,
        index_name: &str,
        columns: &[String],
        rollback: &mut RollbackBuffer,
    ) {
        log::debug!("add index {} on {:?}", index_name, columns);

        let (schema, table_name, fields, new_cached) = {
            let t = self.catalog.table(id);
            (t.schema.clone(), t.name.clone(), t.fields.clone(), t.new_cached)
        };

        let mut key_max_len = 0usize;
        for column in columns {
            let found = fields
                .iter()
                .find(|f| f.field.eq_ignore_ascii_case(column));
            match found {
                Some(field) => {
                    key_max_len += field_byte_length(&field.field_type);
                    if field.field_type.contains("bolb") {
                        self.append_error_no(CheckCode::BlobUsedAsKey, &[&field.field]);
                    }
                }
                None => {
                    self.append_error_no(
                        CheckCode::ColumnNotExisted,
                        &[&format!("{}.{}", table_name, column)],
                    );
                }
            }
        }

        if index_name.len() > self.config.max_index_identifier_len as usize {
            self.append_error_no(CheckCode::TooLongIdent, &[index_name]);
        }

        if key_max_len > MAX_KEY_LENGTH {
            self.append_error_no(
                CheckCode::TooLongKey,
                &[index_name, &MAX_KEY_LENGTH.to_string()],
            );
        }

        if !new_cached {
            let result = match self.db.as_mut() {
                Some(db) => db.show_index(&schema, &table_name),
                None => Ok(Vec::new()),
            };
            let rows: Vec<IndexInfo> = match result {
                Ok(rows) => rows,
                Err(err) => {
                    self.append_error_message(&err.message);
                    Vec::new()
                }
            };

            if rows
                .iter()
                .any(|row| row.index_name.eq_ignore_ascii_case(index_name))
            {
                self.append_error_no(CheckCode::DupIndex, &[index_name, &schema, &table_name]);
            }

            if self.config.max_keys > 0 && rows.len() > self.config.max_keys as usize {
                self.append_error_no(
                    CheckCode::TooManyKeys,
                    &[&table_name, &self.config.max_keys.to_string()],
                );
            }
        }

        if self.opt.execute {
            if index_name == "PRIMARY" {
                rollback.push("DROP PRIMARY KEY,");
            } else {
                rollback.push(format!("DROP INDEX `{}`,", index_name));
            }
        }
    }

    /// Vet an index drop against the live catalog and synthesize the
    /// inverse ADD.
    pub(crate) fn check_drop_index(
        &mut self,
        id: TableId,
        index_name: &str,
        rollback: &mut RollbackBuffer,
    ) -> bool {
        log::debug!("drop index {}", index_name);

        let (schema, table_name) = {
            let t = self.catalog.table(id);
            (t.schema.clone(), t.name.clone())
        };

        let result = match self.db.as_mut() {
            Some(db) => db.show_index(&schema, &table_name),
            None => return false,
        };
        let rows: Vec<IndexInfo> = match result {
            Ok(rows) => rows
                .into_iter()
                .filter(|row| row.index_name.eq_ignore_ascii_case(index_name))
                .collect(),
            Err(err) => {
                self.append_error_message(&err.message);
                return false;
            }
        };

        if rows.is_empty() {
            self.append_error_no(
                CheckCode::CantDropFieldOrKey,
                &[&format!("{}.{}", table_name, index_name)],
            );
            return false;
        }

        if self.opt.execute {
            let mut fragment = String::new();
            for (i, row) in rows.iter().enumerate() {
                if i == 0 {
                    if index_name == "PRIMARY" {
                        fragment.push_str("ADD PRIMARY KEY(");
                    } else if !row.non_unique {
                        fragment.push_str(&format!("ADD UNIQUE INDEX `{}`(", index_name));
                    } else {
                        fragment.push_str(&format!("ADD INDEX `{}`(", index_name));
                    }
                    fragment.push_str(&format!("`{}`", row.column_name));
                } else {
                    fragment.push_str(&format!(",`{}`", row.column_name));
                }
            }
            fragment.push_str("),");
            rollback.push(fragment);
        }

        true
    }

    /// Standalone `CREATE [UNIQUE] INDEX name ON table (cols)`.
    pub(crate) fn check_create_index_stmt(
        &mut self,
        table: &TableRef,
        index_name: &str,
        columns: &[String],
    ) {
        let Some(id) = self.table_from_cache(table, true) else {
            return;
        };
        self.current.table = Some(id);

        let mut rollback = RollbackBuffer::new();
        if self.opt.execute {
            let t = self.catalog.table(id);
            rollback.push(format!("ALTER TABLE `{}`.`{}` ", t.schema, t.name));
        }

        self.check_create_index(id, index_name, columns, &mut rollback);

        if self.opt.execute {
            self.current.ddl_rollback = rollback.render();
        }
    }

    /// Standalone `DROP INDEX name ON table`.
    pub(crate) fn check_drop_index_stmt(&mut self, table: &TableRef, index_name: &str) {
        let Some(id) = self.table_from_cache(table, true) else {
            return;
        };
        self.current.table = Some(id);

        let mut rollback = RollbackBuffer::new();
        if self.opt.execute {
            let t = self.catalog.table(id);
            rollback.push(format!("ALTER TABLE `{}`.`{}` ", t.schema, t.name));
        }

        self.check_drop_index(id, index_name, &mut rollback);

        if self.opt.execute {
            self.current.ddl_rollback = rollback.render();
        }
    }
}
