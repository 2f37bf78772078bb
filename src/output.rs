//! Resolved state: structured export as JSON and shell statements.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Final state of a successful resolution: flag values in alphabetical
/// order, positional arguments in encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArgs {
    pub flags: BTreeMap<String, String>,
    pub positionals: Vec<String>,
}

impl ResolvedArgs {
    /// Resolved value of a flag.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.flags.get(name).map(String::as_str)
    }

    /// Resolved boolean; `None` when the flag is unknown or not canonical.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// Resolved integer; `None` when the flag is unknown, unset or not an
    /// integer.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name)?.parse().ok()
    }

    /// Serialize to JSON. Escaping is lossless; feeding the output back
    /// through a JSON parser reproduces the exact values.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Render shell `export` statements, one per flag, plus the positional
    /// list. Deterministic: flags are already alphabetically ordered.
    pub fn to_exports(&self, prefix: &str) -> String {
        let mut output = String::new();
        for (name, value) in &self.flags {
            let var_name = format!("{}{}", prefix, to_shell_var_name(name));
            output.push_str(&format!(
                "export {}=\"{}\"\n",
                var_name,
                escape_shell_value(value)
            ));
        }
        let positionals: Vec<String> = self
            .positionals
            .iter()
            .map(|p| format!("\"{}\"", escape_shell_value(p)))
            .collect();
        output.push_str(&format!(
            "export {}ARGS=({})\n",
            prefix,
            positionals.join(" ")
        ));
        output
    }

    /// Write the export statements to a persisted temporary file and return
    /// its path, for a calling script to source.
    pub fn export_file(&self, prefix: &str) -> Result<PathBuf> {
        let mut file = NamedTempFile::new()?;
        file.write_all(self.to_exports(prefix).as_bytes())?;
        let path = file.into_temp_path().keep()?;
        Ok(path)
    }
}

/// Escape a string for safe use in a shell double-quoted context.
///
/// Escapes: $, `, \, ", and !
fn escape_shell_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '$' => escaped.push_str("\\$"),
            '`' => escaped.push_str("\\`"),
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '!' => escaped.push_str("\\!"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Convert a flag name to a valid shell variable name.
///
/// Converts to uppercase and replaces hyphens with underscores.
fn to_shell_var_name(name: &str) -> String {
    name.to_uppercase().replace('-', "_")
}
