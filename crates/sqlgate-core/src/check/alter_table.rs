//! ALTER TABLE validation: one pass over the spec list, each accepted spec
//! contributing a rollback fragment.

use crate::driver::Connector;
use crate::rollback::{
    add_column_fragment, change_column_fragment, modify_column_fragment, RollbackBuffer,
};
use crate::session::Session;
use sqlgate_commons::errors::CheckCode;
use sqlgate_commons::models::{FieldInfo, TableId};
use sqlgate_sql::ast::{
    AlterSpec, AlterTableStmt, ColumnDefinition, ColumnPosition, TableRef,
};

impl<C: Connector> Session<C> {
    pub(crate) fn check_alter_table(&mut self, alter: &AlterTableStmt) {
        log::debug!("ALTER TABLE {}", alter.table.name);

        let schema = alter.table.schema_or(&self.db_name).to_string();
        self.check_db_exists(&schema, true);

        let Some(id) = self.table_from_cache(&alter.table, true) else {
            return;
        };

        self.show_table_status(id);
        self.current.table = Some(id);

        let mut rollback = RollbackBuffer::new();
        if self.opt.execute {
            let t = self.catalog.table(id);
            rollback.push(format!("ALTER TABLE `{}`.`{}` ", t.schema, t.name));
        }

        for spec in &alter.specs {
            match spec {
                AlterSpec::AddColumn { columns, position } => {
                    self.check_add_column(id, columns, position.as_ref(), &mut rollback);
                }
                AlterSpec::DropColumn { name } => {
                    self.check_drop_column(id, name, &mut rollback);
                }
                AlterSpec::ModifyColumn { column, .. } => {
                    self.check_modify_column(id, None, column, &mut rollback);
                }
                AlterSpec::ChangeColumn {
                    old_name, column, ..
                } => {
                    self.check_modify_column(id, Some(old_name.as_str()), column, &mut rollback);
                }
                AlterSpec::AddIndex {
                    name,
                    unique: _,
                    columns,
                } => {
                    self.check_create_index(id, name, columns, &mut rollback);
                }
                AlterSpec::AddPrimaryKey { columns } => {
                    self.check_create_index(id, "PRIMARY", columns, &mut rollback);
                }
                AlterSpec::DropIndex { name } => {
                    self.check_drop_index(id, name, &mut rollback);
                }
                AlterSpec::DropPrimaryKey => {
                    self.check_drop_index(id, "PRIMARY", &mut rollback);
                }
                AlterSpec::DropForeignKey { .. } => {
                    self.append_error_no(CheckCode::NotSupportedYet, &[]);
                }
                AlterSpec::RenameTable { new_table } => {
                    self.check_alter_rename_table(id, new_table, &mut rollback);
                }
                AlterSpec::Unsupported => {
                    self.append_error_no(CheckCode::NotSupportedYet, &[]);
                }
            }
        }

        if self.opt.execute {
            self.current.ddl_rollback = rollback.render();
        }
    }

    fn check_add_column(
        &mut self,
        id: TableId,
        columns: &[ColumnDefinition],
        position: Option<&ColumnPosition>,
        rollback: &mut RollbackBuffer,
    ) {
        let table_name = self.catalog.table(id).name.clone();

        for column in columns {
            if self.catalog.table(id).has_field(&column.name) {
                self.append_error_no(
                    CheckCode::ColumnExisted,
                    &[&format!("{}.{}", table_name, column.name)],
                );
            } else {
                self.mysql_check_field(&table_name, column);

                self.catalog
                    .table_mut(id)
                    .fields
                    .push(column.to_field_info());

                if self.opt.execute {
                    rollback.push(format!("DROP COLUMN `{}`,", column.name));
                }
            }
        }

        if let Some(ColumnPosition::After(relative)) = position {
            if !self.catalog.table(id).has_field(relative) {
                self.append_error_no(
                    CheckCode::ColumnNotExisted,
                    &[&format!("{}.{}", table_name, relative)],
                );
            }
        }
    }

    fn check_drop_column(&mut self, id: TableId, name: &str, rollback: &mut RollbackBuffer) {
        let table_name = self.catalog.table(id).name.clone();

        match self.catalog.table(id).field(name).cloned() {
            Some(field) => self.drop_column_rollback(&field, rollback),
            None => {
                self.append_error_no(
                    CheckCode::ColumnNotExisted,
                    &[&format!("{}.{}", table_name, name)],
                );
            }
        }
    }

    fn drop_column_rollback(&mut self, field: &FieldInfo, rollback: &mut RollbackBuffer) {
        if self.opt.check {
            return;
        }
        rollback.push(add_column_fragment(field));
    }

    /// MODIFY COLUMN, and CHANGE COLUMN when `old_name` is given.
    fn check_modify_column(
        &mut self,
        id: TableId,
        old_name: Option<&str>,
        column: &ColumnDefinition,
        rollback: &mut RollbackBuffer,
    ) {
        let (table_name, fields) = {
            let t = self.catalog.table(id);
            (t.name.clone(), t.fields.clone())
        };

        let find = |name: &str| {
            fields
                .iter()
                .find(|f| f.field.eq_ignore_ascii_case(name))
                .cloned()
        };

        let mut restored: Option<FieldInfo> = None;

        let name_unchanged = match old_name {
            None => true,
            Some(old) => old.eq_ignore_ascii_case(&column.name),
        };

        if name_unchanged {
            match find(&column.name) {
                Some(field) => {
                    if self.opt.execute {
                        rollback.push(modify_column_fragment(&field));
                    }
                    restored = Some(field);
                }
                None => {
                    self.append_error_no(
                        CheckCode::ColumnNotExisted,
                        &[&format!("{}.{}", table_name, column.name)],
                    );
                }
            }
        } else {
            let old = old_name.unwrap_or_default();
            let old_field = find(old);
            let new_found = find(&column.name).is_some();

            if new_found {
                self.append_error_no(
                    CheckCode::ColumnExisted,
                    &[&format!("{}.{}", table_name, column.name)],
                );
            }
            if old_field.is_none() {
                self.append_error_no(
                    CheckCode::ColumnNotExisted,
                    &[&format!("{}.{}", table_name, old)],
                );
            }

            if let (false, Some(field)) = (new_found, old_field) {
                if self.opt.execute {
                    rollback.push(change_column_fragment(&column.name, &field));
                }
                restored = Some(field);
            }
        }

        if column.charset.is_some() || column.collation.is_some() {
            self.append_error_no(CheckCode::CharsetOnColumn, &[&table_name, &column.name]);
        }

        if self.has_error() {
            return;
        }

        if let Some(previous) = restored {
            let new_type = column.field_type.compact_str();

            if column.field_type.is_resizable_family() {
                // Resizing within the decimal/char/varchar family is fine;
                // anything else is a conversion.
                let prefix_len = previous.field_type.len().min(7);
                let prefix = previous
                    .field_type
                    .get(..prefix_len)
                    .unwrap_or(&previous.field_type);
                if !new_type.contains(prefix) {
                    self.append_error_no(
                        CheckCode::ChangeColumnType,
                        &[
                            &format!("{}.{}", table_name, column.name),
                            &previous.field_type,
                            &new_type,
                        ],
                    );
                }
            } else if new_type != previous.field_type {
                self.append_error_no(
                    CheckCode::ChangeColumnType,
                    &[
                        &format!("{}.{}", table_name, column.name),
                        &previous.field_type,
                        &new_type,
                    ],
                );
            }
        }

        self.mysql_check_field(&table_name, column);
    }

    fn check_alter_rename_table(
        &mut self,
        id: TableId,
        new_table: &TableRef,
        rollback: &mut RollbackBuffer,
    ) {
        if self.table_from_cache(new_table, false).is_some() {
            self.append_error_no(CheckCode::TableExistsError, &[&new_table.name]);
            return;
        }

        let (old_schema, old_name) = {
            let t = self.catalog.table(id);
            (t.schema.clone(), t.name.clone())
        };

        let mut renamed = self.catalog.copy_of(id);
        self.catalog.table_mut(id).is_deleted = true;
        renamed.name = new_table.name.clone();
        renamed.schema = new_table.schema_or(&self.db_name).to_string();
        let new_schema = renamed.schema.clone();

        let new_id = self.catalog.cache_new(renamed);
        self.current.table = Some(new_id);

        if self.opt.execute {
            rollback.replace_with(format!(
                "RENAME TABLE `{}`.`{}` TO `{}`.`{}`;",
                new_schema, new_table.name, old_schema, old_name
            ));
        }
    }
}
