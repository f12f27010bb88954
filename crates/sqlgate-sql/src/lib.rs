//! SQL front end of the sqlgate engine.
//!
//! Turns a raw client batch into things the core can review:
//! - [`splitter`] cuts the batch into statements, ignoring `;` inside
//!   strings and comments
//! - [`options`] reads the connection/mode options out of the leading
//!   marker comment
//! - [`ast`] is the engine-owned statement model the rule engine consumes
//! - [`parser`] classifies each statement and parses it into [`ast`] types
//!   on top of the `sqlparser` crate

pub mod ast;
pub mod options;
pub mod parser;
pub mod splitter;

pub use ast::Statement;
pub use options::SourceOptions;
pub use parser::{parse_statement, ParseError};
pub use splitter::split_statements;
