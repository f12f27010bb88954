//! Rollback synthesis helpers: inverse-DDL fragments, operation ids, and
//! the buffer that accumulates fragments until a statement's rollback text
//! is finalized.

use sqlgate_commons::models::FieldInfo;

/// Operation id for a backed-up statement: `execTimestamp_threadId_8digitSeq`.
pub fn make_opid(exec_timestamp: i64, thread_id: u32, seq_no: usize) -> String {
    format!("{}_{}_{:08}", exec_timestamp, thread_id, seq_no)
}

/// Escape a string literal for embedding in a generated INSERT.
pub fn escape_sql_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(ch),
        }
    }
    out
}

/// Ordered list of inverse-DDL fragments for one statement.
///
/// Fragments accumulate during CHECK (prefix first, one fragment per
/// accepted spec, comma-terminated) and render once at the end: a trailing
/// comma becomes the `;` terminator. A whole-statement inverse (RENAME,
/// SHOW CREATE TABLE) replaces everything accumulated so far.
#[derive(Debug, Default)]
pub struct RollbackBuffer {
    parts: Vec<String>,
}

impl RollbackBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: impl Into<String>) {
        self.parts.push(fragment.into());
    }

    /// Discard accumulated fragments in favor of a complete statement.
    pub fn replace_with(&mut self, statement: impl Into<String>) {
        self.parts.clear();
        self.parts.push(statement.into());
    }

    pub fn render(&self) -> String {
        let mut text = self.parts.concat();
        if text.ends_with(',') {
            text.pop();
            text.push(';');
        }
        text
    }
}

fn restore_tail(field: &FieldInfo) -> String {
    let mut buf = String::new();
    buf.push_str(&field.field_type);
    if field.null == "NO" {
        buf.push_str(" NOT NULL");
    }
    if !field.default_value.is_empty() {
        buf.push_str(" DEFALUT '");
        buf.push_str(&field.default_value);
        buf.push('\'');
    }
    if !field.comment.is_empty() {
        buf.push_str(" COMMENT '");
        buf.push_str(&field.comment);
        buf.push('\'');
    }
    buf.push(',');
    buf
}

/// Inverse of DROP COLUMN: re-add the column with its type, nullability,
/// default and comment.
pub fn add_column_fragment(field: &FieldInfo) -> String {
    format!("ADD COLUMN `{}` {}", field.field, restore_tail(field))
}

/// Inverse of MODIFY COLUMN: restore the previous definition.
pub fn modify_column_fragment(field: &FieldInfo) -> String {
    format!("MODIFY COLUMN `{}` {}", field.field, restore_tail(field))
}

/// Inverse of CHANGE COLUMN: rename back and restore the previous
/// definition.
pub fn change_column_fragment(new_name: &str, field: &FieldInfo) -> String {
    format!(
        "CHANGE COLUMN `{}` `{}` {}",
        new_name,
        field.field,
        restore_tail(field)
    )
}
