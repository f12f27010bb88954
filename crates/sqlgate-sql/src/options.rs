//! Option parsing from the leading marker comment.
//!
//! A batch opens with a comment of `;`-separated `name=value` pairs ahead of
//! the begin marker:
//!
//! ```text
//! /*--user=admin;--password=secret;--host=127.0.0.1;--port=3306;--execute=true;*/
//! inception_magic_start;
//! ```
//!
//! Dashes and underscores in option names are ignored, names are matched
//! case-insensitively, and only scalar values are meaningful.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static RE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^\s*/\*(.*?)\*/").unwrap());

/// Connection and mode options for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Validate only; forces `execute` and `backup` off.
    pub check: bool,
    /// Run accepted statements against the target.
    pub execute: bool,
    /// Synthesize rollback artifacts; needs a configured backup endpoint.
    pub backup: bool,
    /// Treat severity-1 findings as non-blocking.
    pub ignore_warnings: bool,
}

/// Failure to extract usable options from the marker.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OptionsError {
    /// Marker comment absent, or a required connection option missing.
    #[error("invalid source information")]
    InvalidSource,
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "on")
}

impl SourceOptions {
    /// Parse options out of the begin statement's text.
    pub fn parse(sql: &str) -> Result<Self, OptionsError> {
        let caps = RE_MARKER.captures(sql).ok_or(OptionsError::InvalidSource)?;
        let body = caps.get(1).map(|m| m.as_str()).unwrap_or("");

        let mut opt = SourceOptions::default();

        for entry in body.split(';') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let Some((name, value)) = entry.split_once('=') else {
                continue;
            };
            let name: String = name
                .chars()
                .filter(|c| *c != '-' && *c != '_')
                .collect::<String>()
                .trim()
                .to_ascii_lowercase();
            let value = value.trim();

            match name.as_str() {
                "host" => opt.host = value.to_string(),
                "port" => opt.port = value.parse().unwrap_or(0),
                "user" => opt.user = value.to_string(),
                "password" => opt.password = value.to_string(),
                "check" => opt.check = parse_bool(value),
                "execute" => opt.execute = parse_bool(value),
                "backup" => opt.backup = parse_bool(value),
                "ignorewarnings" => opt.ignore_warnings = parse_bool(value),
                _ => {
                    log::debug!("ignoring unknown batch option '{}'", name);
                }
            }
        }

        if opt.check {
            opt.execute = false;
            opt.backup = false;
        }

        if opt.host.is_empty() || opt.port == 0 || opt.user.is_empty() || opt.password.is_empty() {
            return Err(OptionsError::InvalidSource);
        }

        Ok(opt)
    }
}
