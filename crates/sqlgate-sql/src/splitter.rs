//! Statement splitting for multi-statement batch payloads.
//!
//! Splits on `;` while ignoring semicolons that appear inside quoted
//! strings, backtick identifiers, or comments, so a literal like
//! `'a;b'` never breaks a statement in two. Comments are kept attached to
//! the statement they precede, which is what carries the option marker
//! comment into the begin statement.

/// Error produced when a batch string cannot be split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitError {
    message: String,
}

impl SplitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SplitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SplitError {}

/// Split a SQL batch payload into individual statements.
///
/// Preserves statement order; trailing input without a terminating `;` is
/// returned as a final statement.
pub fn split_statements(sql: &str) -> Result<Vec<String>, SplitError> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();

    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut in_backtick = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    while let Some(ch) = chars.next() {
        if in_line_comment {
            if ch == '\n' {
                in_line_comment = false;
            }
            current.push(ch);
            continue;
        }

        if in_block_comment {
            if ch == '*' && chars.peek() == Some(&'/') {
                current.push(ch);
                current.push(chars.next().unwrap());
                in_block_comment = false;
                continue;
            }
            current.push(ch);
            continue;
        }

        if !in_single_quote && !in_double_quote && !in_backtick {
            if ch == '-' && chars.peek() == Some(&'-') {
                current.push(ch);
                current.push(chars.next().unwrap());
                in_line_comment = true;
                continue;
            }

            if ch == '/' && chars.peek() == Some(&'*') {
                current.push(ch);
                current.push(chars.next().unwrap());
                in_block_comment = true;
                continue;
            }
        }

        match ch {
            '\'' if !in_double_quote && !in_backtick => {
                if in_single_quote && chars.peek() == Some(&'\'') {
                    // Escaped quote inside single-quoted string
                    current.push(ch);
                    current.push(chars.next().unwrap());
                    continue;
                }
                in_single_quote = !in_single_quote;
                current.push(ch);
            }
            '"' if !in_single_quote && !in_backtick => {
                if in_double_quote && chars.peek() == Some(&'"') {
                    current.push(ch);
                    current.push(chars.next().unwrap());
                    continue;
                }
                in_double_quote = !in_double_quote;
                current.push(ch);
            }
            '`' if !in_single_quote && !in_double_quote => {
                in_backtick = !in_backtick;
                current.push(ch);
            }
            ';' if !(in_single_quote || in_double_quote || in_backtick) => {
                let stmt = current.trim();
                if !stmt.is_empty() {
                    statements.push(stmt.to_string());
                }
                current.clear();
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if in_single_quote || in_double_quote || in_backtick {
        return Err(SplitError::new("Unterminated quoted string in SQL batch"));
    }

    if in_block_comment {
        return Err(SplitError::new("Unterminated block comment in SQL batch"));
    }

    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }

    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::split_statements;

    #[test]
    fn splits_simple_statements() {
        let sql = "CREATE TABLE t(id INT); INSERT INTO t VALUES (1);";
        let statements = split_statements(sql).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "CREATE TABLE t(id INT)");
        assert_eq!(statements[1], "INSERT INTO t VALUES (1)");
    }

    #[test]
    fn ignores_semicolons_in_strings() {
        let sql = "INSERT INTO logs(message) VALUES('value;still part of string'); SELECT 1;";
        let statements = split_statements(sql).unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("value;still part of string"));
    }

    #[test]
    fn ignores_semicolons_in_comments() {
        let sql = "SELECT 1; -- second statement;\nSELECT 2; /* comment; */ SELECT 3;";
        let statements = split_statements(sql).unwrap();
        assert_eq!(statements.len(), 3);
    }

    #[test]
    fn keeps_marker_comment_attached() {
        let sql = "/*--user=admin;--password=x;--host=127.0.0.1;--port=3306;*/\ninception_magic_start;\nSELECT 1;\ninception_magic_commit;";
        let statements = split_statements(sql).unwrap();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("/*"));
        assert!(statements[0].contains("inception_magic_start"));
        assert_eq!(statements[2], "inception_magic_commit");
    }

    #[test]
    fn handles_escaped_quotes() {
        let sql = "INSERT INTO t(text) VALUES('It''s fine; really'); SELECT 1;";
        let statements = split_statements(sql).unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("It''s fine; really"));
    }

    #[test]
    fn error_on_unterminated_string() {
        let sql = "INSERT INTO t(text) VALUES('missing end);";
        let err = split_statements(sql).unwrap_err();
        assert!(err.to_string().contains("Unterminated quoted string"));
    }

    #[test]
    fn statement_without_trailing_semicolon() {
        let statements = split_statements("SELECT 1").unwrap();
        assert_eq!(statements, vec!["SELECT 1".to_string()]);
    }
}
