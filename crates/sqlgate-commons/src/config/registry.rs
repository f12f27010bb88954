//! Variable registry over [`AuditConfig`].
//!
//! Backs the `inception show variables` / `inception set` statements with an
//! explicit name table instead of runtime reflection over the struct. Every
//! settable policy field appears here; getters render to strings, setters
//! parse and validate.

use super::types::AuditConfig;

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(format!("Invalid boolean value '{}'", value)),
    }
}

impl AuditConfig {
    /// All registered variables as (name, rendered value), sorted by name.
    pub fn variables(&self) -> Vec<(String, String)> {
        let mut vars: Vec<(String, String)> = vec![
            ("backup_host", self.backup_host.clone()),
            ("backup_password", self.backup_password.clone()),
            ("backup_port", self.backup_port.to_string()),
            ("backup_user", self.backup_user.clone()),
            ("check_column_comment", self.check_column_comment.to_string()),
            ("check_table_comment", self.check_table_comment.to_string()),
            ("enable_drop_table", self.enable_drop_table.to_string()),
            ("enable_nullable", self.enable_nullable.to_string()),
            ("max_index_identifier_len", self.max_index_identifier_len.to_string()),
            ("max_keys", self.max_keys.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        vars.sort();
        vars
    }

    /// Set one registered variable from its textual value.
    ///
    /// Names are matched case-insensitively with dashes treated as
    /// underscores, mirroring how option-marker names are normalized.
    pub fn set_variable(&mut self, name: &str, value: &str) -> Result<(), String> {
        let key = name.to_ascii_lowercase().replace('-', "_");
        match key.as_str() {
            "enable_drop_table" => self.enable_drop_table = parse_bool(value)?,
            "enable_nullable" => self.enable_nullable = parse_bool(value)?,
            "check_table_comment" => self.check_table_comment = parse_bool(value)?,
            "check_column_comment" => self.check_column_comment = parse_bool(value)?,
            "max_keys" => {
                self.max_keys = value
                    .parse()
                    .map_err(|_| format!("Invalid integer value '{}'", value))?
            }
            "max_index_identifier_len" => {
                let len: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid integer value '{}'", value))?;
                if len == 0 {
                    return Err("max_index_identifier_len cannot be 0".to_string());
                }
                self.max_index_identifier_len = len;
            }
            "backup_host" => self.backup_host = value.to_string(),
            "backup_port" => {
                self.backup_port = value
                    .parse()
                    .map_err(|_| format!("Invalid port value '{}'", value))?
            }
            "backup_user" => self.backup_user = value.to_string(),
            "backup_password" => self.backup_password = value.to_string(),
            _ => return Err(format!("Unknown system variable '{}'", name)),
        }
        Ok(())
    }
}
