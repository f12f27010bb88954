//! Session-local catalog cache.
//!
//! The catalog is an arena of [`TableInfo`] entries addressed by
//! [`TableId`], plus a case-insensitive `(schema, name)` index and a
//! database-name cache. Entries are never removed during a batch: dropped or
//! renamed tables stay as tombstones (`is_deleted`) so later references to
//! the old name report "not exists" without touching the live catalog, and a
//! DROP-then-CREATE simply points the index at a fresh entry.

use sqlgate_commons::models::{TableId, TableInfo};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<TableInfo>,
    by_key: HashMap<String, TableId>,
    databases: HashSet<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(schema: &str, name: &str) -> String {
        format!("{}.{}", schema.to_lowercase(), name.to_lowercase())
    }

    /// Look up a table by name. Tombstoned entries are returned too; the
    /// caller decides how a deleted table is reported.
    pub fn get(&self, schema: &str, name: &str) -> Option<TableId> {
        self.by_key.get(&Self::key(schema, name)).copied()
    }

    pub fn table(&self, id: TableId) -> &TableInfo {
        &self.entries[id.0]
    }

    pub fn table_mut(&mut self, id: TableId) -> &mut TableInfo {
        &mut self.entries[id.0]
    }

    /// Insert a table resolved from the live catalog.
    pub fn insert(&mut self, table: TableInfo) -> TableId {
        let key = Self::key(&table.schema, &table.name);
        let id = TableId(self.entries.len());
        self.entries.push(table);
        self.by_key.insert(key, id);
        id
    }

    /// Insert a table created within this batch. Unconditionally overwrites
    /// the index entry, which covers DROP-then-CREATE of the same name.
    pub fn cache_new(&mut self, mut table: TableInfo) -> TableId {
        table.new_cached = true;
        self.insert(table)
    }

    /// Deep copy of name, schema and field list; flags reset. Used by
    /// CREATE TABLE LIKE and RENAME TABLE so the twin evolves independently.
    pub fn copy_of(&self, id: TableId) -> TableInfo {
        let source = self.table(id);
        TableInfo {
            schema: source.schema.clone(),
            name: source.name.clone(),
            fields: source.fields.clone(),
            ..Default::default()
        }
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.databases.contains(&name.to_lowercase())
    }

    pub fn add_database(&mut self, name: &str) {
        self.databases.insert(name.to_lowercase());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlgate_commons::models::FieldInfo;

    fn table(schema: &str, name: &str) -> TableInfo {
        let mut t = TableInfo::new(schema, name);
        t.fields.push(FieldInfo {
            field: "id".to_string(),
            field_type: "int(11)".to_string(),
            null: "NO".to_string(),
            key: "PRI".to_string(),
            ..Default::default()
        });
        t
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut c = Catalog::new();
        let id = c.insert(table("Db1", "Users"));
        assert_eq!(c.get("db1", "users"), Some(id));
        assert_eq!(c.get("DB1", "USERS"), Some(id));
        assert_eq!(c.get("db1", "missing"), None);
    }

    #[test]
    fn test_tombstone_stays_resolvable() {
        let mut c = Catalog::new();
        let id = c.insert(table("db1", "t1"));
        c.table_mut(id).is_deleted = true;
        let found = c.get("db1", "t1").unwrap();
        assert!(c.table(found).is_deleted);
    }

    #[test]
    fn test_drop_then_create_overwrites_index() {
        let mut c = Catalog::new();
        let old = c.insert(table("db1", "t1"));
        c.table_mut(old).is_deleted = true;

        let new = c.cache_new(table("db1", "t1"));
        assert_ne!(old, new);
        assert_eq!(c.get("db1", "t1"), Some(new));
        assert!(c.table(new).new_cached);
        assert!(!c.table(new).is_deleted);
        // the tombstoned entry is still addressable by id
        assert!(c.table(old).is_deleted);
    }

    #[test]
    fn test_copy_is_independent() {
        let mut c = Catalog::new();
        let id = c.insert(table("db1", "t1"));
        let mut copy = c.copy_of(id);
        copy.name = "t2".to_string();
        copy.fields.push(FieldInfo::default());
        assert_eq!(c.table(id).fields.len(), 1);
        assert_eq!(copy.fields.len(), 2);
        assert!(!copy.is_deleted);
    }

    #[test]
    fn test_database_cache() {
        let mut c = Catalog::new();
        assert!(!c.has_database("db1"));
        c.add_database("Db1");
        assert!(c.has_database("db1"));
        assert!(c.has_database("DB1"));
    }
}
