//! Line-based `key = value` configuration file source.

use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed config line {line_no}: '{line}'")]
    Malformed { line_no: usize, line: String },
}

/// Read a configuration file and return its assignments in file order.
///
/// Blank lines and `#`-prefixed comment lines are skipped; every other line
/// must be `key = value`. A missing or unreadable file is a hard error.
pub fn load_assignments(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_assignments(&text)
}

/// Parse configuration text into `(key, value)` pairs.
///
/// Any malformed line aborts the whole load; no partial assignment list is
/// returned.
pub fn parse_assignments(text: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let mut assignments = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let malformed = || ConfigError::Malformed {
            line_no: i + 1,
            line: raw.to_string(),
        };

        let (key, value) = line.split_once('=').ok_or_else(malformed)?;
        let key = key.trim();
        let value = value.trim();
        if !is_valid_key(key) {
            return Err(malformed());
        }
        assignments.push((key.to_string(), value.to_string()));
    }

    Ok(assignments)
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
