//! Schema snapshots: tables, fields and indexes as the engine models them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Handle into the session catalog's table store.
///
/// Records carry a `TableId` instead of a reference so that later statements
/// can keep mutating the underlying entry (rename, drop, column add) without
/// aliasing; the id stays valid for the life of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId(pub usize);

/// One column, in the shape `SHOW FULL FIELDS` reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub field: String,
    /// Rendered type, e.g. `varchar(10)` or `bigint(20) unsigned`.
    pub field_type: String,
    /// "YES" or "NO".
    pub null: String,
    /// "", "PRI" or "UNI".
    pub key: String,
    /// Empty string means no default.
    pub default_value: String,
    pub extra: String,
    pub comment: String,
}

/// One row of `SHOW INDEX FROM`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub table: String,
    /// true for a non-unique secondary index.
    pub non_unique: bool,
    pub index_name: String,
    pub seq_in_index: u32,
    pub column_name: String,
}

/// Session-local model of one table.
///
/// Lifecycle: entries are never removed from the catalog during a batch.
/// After DROP or RENAME the entry stays with `is_deleted` set so that later
/// references to the old name report "not exists" without a live lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    pub fields: Vec<FieldInfo>,

    /// Tombstone: dropped or renamed away within this batch.
    pub is_deleted: bool,
    /// Backup database/tables for this source table already created.
    pub is_created: bool,
    /// Created entirely within this batch; has no live-catalog counterpart.
    pub new_cached: bool,

    /// Positions of the columns forming the backup row key.
    pub has_primary: bool,
    pub primary_cols: BTreeSet<usize>,
}

impl TableInfo {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Case-insensitive column lookup.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.field.eq_ignore_ascii_case(name))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Derive the primary (or unique, as fallback) column positions used to
    /// key backup rows.
    pub fn derive_primary_cols(&mut self) {
        let primaries: BTreeSet<usize> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.key == "PRI")
            .map(|(i, _)| i)
            .collect();
        let uniques: BTreeSet<usize> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.key == "UNI")
            .map(|(i, _)| i)
            .collect();

        if !primaries.is_empty() {
            self.primary_cols = primaries;
            self.has_primary = true;
        } else if !uniques.is_empty() {
            self.primary_cols = uniques;
            self.has_primary = true;
        } else {
            self.primary_cols.clear();
            self.has_primary = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, key: &str) -> FieldInfo {
        FieldInfo {
            field: name.to_string(),
            field_type: "int(11)".to_string(),
            null: "NO".to_string(),
            key: key.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_field_lookup_is_case_insensitive() {
        let mut t = TableInfo::new("db", "t");
        t.fields.push(field("Id", "PRI"));
        assert!(t.has_field("id"));
        assert!(t.has_field("ID"));
        assert!(!t.has_field("missing"));
    }

    #[test]
    fn test_primary_cols_prefer_primary_over_unique() {
        let mut t = TableInfo::new("db", "t");
        t.fields.push(field("a", "UNI"));
        t.fields.push(field("b", "PRI"));
        t.derive_primary_cols();
        assert!(t.has_primary);
        assert_eq!(t.primary_cols.iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_unique_fallback_when_no_primary() {
        let mut t = TableInfo::new("db", "t");
        t.fields.push(field("a", "UNI"));
        t.fields.push(field("b", ""));
        t.derive_primary_cols();
        assert!(t.has_primary);
        assert_eq!(t.primary_cols.iter().copied().collect::<Vec<_>>(), vec![0]);
    }
}
