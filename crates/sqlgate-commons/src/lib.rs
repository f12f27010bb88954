//! Shared building blocks for the sqlgate engine.
//!
//! This crate holds everything the sql and core crates both need:
//! - the review-finding taxonomy and driver error type ([`errors`])
//! - the audit policy configuration with its variable registry ([`config`])
//! - plain data models: schema snapshots, records, binlog positions ([`models`])
//! - the ordered per-batch record stream ([`records`])

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod records;

pub use config::AuditConfig;
pub use errors::{CheckCode, DriverError};
pub use records::RecordStream;
