//! Binlog coordinates and EXPLAIN plan rows.

use serde::{Deserialize, Serialize};

/// A point in the server's binary log, as reported by `SHOW MASTER STATUS`.
///
/// Ordering is lexicographic on file name, then position, which matches the
/// server's rotation scheme (`bin.000001`, `bin.000002`, ...). The derived
/// `Ord` therefore gives binlog order directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BinlogPosition {
    pub file: String,
    pub position: u64,
}

impl BinlogPosition {
    pub fn new(file: impl Into<String>, position: u64) -> Self {
        Self {
            file: file.into(),
            position,
        }
    }
}

/// One row of EXPLAIN output; only the fields the engine consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplainRow {
    pub select_type: String,
    pub table: String,
    pub access_type: String,
    pub possible_keys: String,
    pub key: String,
    pub key_len: String,
    /// Estimated rows examined; folded into the record's affected rows.
    pub rows: u64,
    pub filtered: f32,
    pub extra: String,
}
