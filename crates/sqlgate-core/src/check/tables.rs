//! CREATE / DROP / RENAME / TRUNCATE TABLE validation.

use crate::driver::Connector;
use crate::session::Session;
use sqlgate_commons::errors::CheckCode;
use sqlgate_commons::models::TableInfo;
use sqlgate_sql::ast::{CreateTableStmt, TableConstraintDef, TableRef};

impl<C: Connector> Session<C> {
    pub(crate) fn check_create_table(&mut self, create: &CreateTableStmt) {
        log::debug!("CREATE TABLE {}", create.table.name);

        let schema = create.table.schema_or(&self.db_name).to_string();
        let table_name = create.table.name.clone();

        self.check_db_exists(&schema, true);

        if self.table_from_cache(&create.table, false).is_some() {
            self.append_error_no(CheckCode::TableExistsError, &[&table_name]);
            return;
        }

        self.current.db_name = schema.clone();
        self.current.table_name = table_name.clone();

        if let Some(like) = &create.like {
            // CREATE TABLE LIKE: the new table starts as a deep copy of the
            // referenced one.
            if let Some(origin) = self.table_from_cache(like, true) {
                let mut table = self.catalog.copy_of(origin);
                table.name = table_name.clone();
                table.schema = schema.clone();
                let id = self.catalog.cache_new(table);
                self.current.table = Some(id);
            }
        } else {
            if let Some(engine) = &create.options.engine {
                if !engine.eq_ignore_ascii_case("innodb") {
                    self.append_error_no(CheckCode::TableMustInnodb, &[&table_name]);
                }
            }

            if create.options.charset.is_some() || create.options.collation.is_some() {
                self.append_error_no(CheckCode::TableCharsetMustNull, &[&table_name]);
            }

            let has_comment = create
                .options
                .comment
                .as_deref()
                .is_some_and(|c| !c.is_empty());

            let mut has_primary = false;
            for constraint in &create.constraints {
                if let TableConstraintDef::PrimaryKey { columns } = constraint {
                    has_primary = !columns.is_empty();

                    for key_column in columns {
                        let declared = create
                            .columns
                            .iter()
                            .any(|c| c.name.eq_ignore_ascii_case(key_column));
                        if !declared {
                            self.append_error_no(
                                CheckCode::ColumnNotExisted,
                                &[&format!("{}.{}", table_name, key_column)],
                            );
                        }
                    }
                    break;
                }
            }

            if !has_primary {
                has_primary = create.columns.iter().any(|c| c.primary_key);
            }

            if !has_primary {
                self.append_error_no(CheckCode::TableMustHavePk, &[&table_name]);
            }

            if !has_comment && self.config.check_table_comment {
                self.append_error_no(CheckCode::TableMustHaveComment, &[&table_name]);
            }

            let mut table = TableInfo::new(schema.clone(), table_name.clone());
            table.fields = create.columns.iter().map(|c| c.to_field_info()).collect();

            for column in &create.columns {
                self.mysql_check_field(&table_name, column);
            }

            let id = self.catalog.cache_new(table);
            self.current.table = Some(id);
        }

        if create.has_partition {
            self.append_error_no(CheckCode::PartitionNotAllowed, &[]);
        }

        if self.opt.execute {
            self.current.ddl_rollback = format!("DROP TABLE `{}`.`{}`;", schema, table_name);
        }
    }

    pub(crate) fn check_drop_table(&mut self, tables: &[TableRef], if_exists: bool) {
        log::debug!("DROP TABLE");

        for table in tables {
            if !self.config.enable_drop_table {
                self.append_error_no(CheckCode::CantDropTable, &[&table.name]);
                continue;
            }

            match self.table_from_cache(table, false) {
                None => {
                    if !if_exists {
                        self.append_error_no(CheckCode::TableNotExistedError, &[&table.name]);
                    }
                }
                Some(id) => {
                    if self.opt.execute {
                        self.show_create_table_rollback(id);
                    }

                    if self.opt.check {
                        self.show_table_status(id);
                    }

                    self.current.table = Some(id);
                    self.catalog.table_mut(id).is_deleted = true;
                }
            }
        }
    }

    pub(crate) fn check_truncate_table(&mut self, table: &TableRef) {
        log::debug!("TRUNCATE TABLE {}", table.name);

        if !self.config.enable_drop_table {
            self.append_error_no(CheckCode::CantDropTable, &[&table.name]);
            return;
        }

        match self.table_from_cache(table, false) {
            None => self.append_error_no(CheckCode::TableNotExistedError, &[&table.name]),
            Some(id) => self.show_table_status(id),
        }
    }

    pub(crate) fn check_rename_table(&mut self, old_table: &TableRef, new_table: &TableRef) {
        log::debug!("RENAME TABLE {} TO {}", old_table.name, new_table.name);

        let origin = self.table_from_cache(old_table, true);
        if let Some(origin_id) = origin {
            self.catalog.table_mut(origin_id).is_deleted = true;
        }

        let existing = self.table_from_cache(new_table, false);
        if existing.is_some() {
            self.append_error_no(CheckCode::TableExistsError, &[&new_table.name]);
        }

        if let (Some(origin_id), None) = (origin, existing) {
            let (old_schema, old_name) = {
                let t = self.catalog.table(origin_id);
                (t.schema.clone(), t.name.clone())
            };

            let mut renamed = self.catalog.copy_of(origin_id);
            renamed.name = new_table.name.clone();
            renamed.schema = new_table.schema_or(&self.db_name).to_string();
            let new_schema = renamed.schema.clone();

            let id = self.catalog.cache_new(renamed);
            self.current.table = Some(id);

            if self.opt.execute {
                self.current.ddl_rollback = format!(
                    "RENAME TABLE `{}`.`{}` TO `{}`.`{}`;",
                    new_schema, new_table.name, old_schema, old_name
                );
            }
        }
    }
}
