//! Policy flags consumed by the rule engine and the backup writer.

use super::defaults::*;
use crate::errors::CheckCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Audit policy for one engine instance.
///
/// Every field is addressable by name through the variable registry (see
/// `registry.rs`), which backs the `inception show variables` and
/// `inception set` statements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Allow DROP TABLE / TRUNCATE TABLE through review.
    #[serde(default = "default_false")]
    pub enable_drop_table: bool,

    /// Allow nullable columns; when off, a nullable column is a finding.
    #[serde(default = "default_true")]
    pub enable_nullable: bool,

    /// Require a COMMENT table option on CREATE TABLE.
    #[serde(default = "default_false")]
    pub check_table_comment: bool,

    /// Require a COMMENT option on every column definition.
    #[serde(default = "default_false")]
    pub check_column_comment: bool,

    /// Upper bound on index count per table; 0 disables the check.
    #[serde(default = "default_max_keys")]
    pub max_keys: u32,

    /// Upper bound on index identifier length.
    #[serde(default = "default_max_index_identifier_len")]
    pub max_index_identifier_len: u32,

    /// Backup endpoint; all four must be set for `backup=true` batches.
    #[serde(default = "default_backup_host")]
    pub backup_host: String,
    #[serde(default = "default_backup_port")]
    pub backup_port: u16,
    #[serde(default)]
    pub backup_user: String,
    #[serde(default)]
    pub backup_password: String,

    /// Per-code severity overrides, keyed by canonical code name.
    #[serde(default)]
    pub severity_overrides: HashMap<String, u8>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enable_drop_table: default_false(),
            enable_nullable: default_true(),
            check_table_comment: default_false(),
            check_column_comment: default_false(),
            max_keys: default_max_keys(),
            max_index_identifier_len: default_max_index_identifier_len(),
            backup_host: default_backup_host(),
            backup_port: default_backup_port(),
            backup_user: String::new(),
            backup_password: String::new(),
            severity_overrides: HashMap::new(),
        }
    }
}

impl AuditConfig {
    /// Effective severity of a finding under this policy.
    pub fn severity_for(&self, code: CheckCode) -> u8 {
        self.severity_overrides
            .get(code.name())
            .copied()
            .map(|level| level.min(2))
            .unwrap_or_else(|| code.default_severity())
    }

    /// Whether the backup endpoint is fully configured.
    pub fn backup_endpoint_complete(&self) -> bool {
        !self.backup_host.is_empty()
            && self.backup_port != 0
            && !self.backup_user.is_empty()
            && !self.backup_password.is_empty()
    }
}
