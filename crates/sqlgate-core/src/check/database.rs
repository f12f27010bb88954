//! USE / CREATE DATABASE / DROP DATABASE validation.

use crate::driver::{Connection, Connector};
use crate::session::Session;
use sqlgate_commons::errors::CheckCode;

impl<C: Connector> Session<C> {
    /// Database existence, answered from the session cache first.
    pub(crate) fn check_db_exists(&mut self, db: &str, report_not_exists: bool) -> bool {
        let db = if db.is_empty() {
            self.db_name.clone()
        } else {
            db.to_string()
        };

        if self.catalog.has_database(&db) {
            return true;
        }

        let result = match self.db.as_mut() {
            Some(conn) => conn.show_databases_like(&db),
            None => return false,
        };

        match result {
            Ok(Some(_)) => {
                self.catalog.add_database(&db);
                true
            }
            Ok(None) => {
                if report_not_exists {
                    self.append_error_no(CheckCode::DbNotExistedError, &[&db]);
                }
                false
            }
            Err(err) => {
                self.append_error_message(&err.message);
                false
            }
        }
    }

    pub(crate) fn check_change_db(&mut self, db: &str) {
        log::debug!("USE {}", db);

        self.db_name = db.to_string();
        if self.check_db_exists(db, true) {
            let result = match self.db.as_mut() {
                Some(conn) => conn.exec(&format!("USE `{}`", db)),
                None => return,
            };
            if let Err(err) = result {
                self.append_error_message(&err.message);
            }
        }
    }

    pub(crate) fn check_create_db(&mut self, name: &str, if_not_exists: bool) {
        log::debug!("CREATE DATABASE {}", name);

        if self.check_db_exists(name, false) {
            if !if_not_exists {
                self.append_error_message(&format!("Database '{}' already exists.", name));
            }
        } else {
            self.catalog.add_database(name);

            if self.opt.execute {
                self.current.ddl_rollback = format!("DROP DATABASE `{}`;", name);
            }
        }
    }

    /// Hard policy: dropping a database is never allowed through review.
    pub(crate) fn check_drop_db(&mut self, name: &str) {
        self.append_error_message(&format!(
            "Command is forbidden! Cannot drop database '{}'.",
            name
        ));
    }
}
