//! Value validation: type checks, allowed values, and pattern matching.

use crate::flag::{FlagDefinition, FlagType, ValuePattern};
use thiserror::Error;

/// A candidate value was rejected for a flag.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("invalid boolean '{value}' for flag '{flag}': expected true, false, yes, no, 0 or 1")]
    InvalidBool { flag: String, value: String },

    #[error("invalid integer '{value}' for flag '{flag}'")]
    InvalidInt { flag: String, value: String },

    #[error("value '{value}' for flag '{flag}' is not one of the allowed values: {allowed}")]
    NotAllowed {
        flag: String,
        value: String,
        allowed: String,
    },

    #[error("value '{value}' for flag '{flag}' does not match the required pattern")]
    PatternMismatch { flag: String, value: String },
}

/// Normalize a boolean value to the canonical "true"/"false" literals.
///
/// Returns `None` when the value is not a recognized boolean form.
pub fn normalize_bool(value: &str) -> Option<&'static str> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some("true"),
        "false" | "no" | "0" => Some("false"),
        _ => None,
    }
}

/// Check whether a value matches `^[+-]?[0-9]+$`.
pub fn is_integer(value: &str) -> bool {
    let digits = value
        .strip_prefix(['+', '-'])
        .unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Validate a candidate value against a flag's type and constraints.
///
/// Clearing an optional int/string flag to the empty string is always legal;
/// it bypasses every other check (empty is the unset sentinel for non-bool
/// types).
pub fn validate_value(def: &FlagDefinition, value: &str) -> Result<(), ValueError> {
    if value.is_empty() && !def.required && def.flag_type != FlagType::Bool {
        return Ok(());
    }

    match def.flag_type {
        FlagType::Bool => {
            if normalize_bool(value).is_none() {
                return Err(ValueError::InvalidBool {
                    flag: def.name.clone(),
                    value: value.to_string(),
                });
            }
        }
        FlagType::Int => {
            if !is_integer(value) {
                return Err(ValueError::InvalidInt {
                    flag: def.name.clone(),
                    value: value.to_string(),
                });
            }
        }
        FlagType::String => {
            if let Some(ref allowed) = def.allowed_values {
                if !allowed.iter().any(|a| a == value) {
                    return Err(ValueError::NotAllowed {
                        flag: def.name.clone(),
                        value: value.to_string(),
                        allowed: allowed.join(", "),
                    });
                }
            }
            if let Some(ref pattern) = def.pattern {
                let matched = match pattern {
                    ValuePattern::Email => is_valid_email(value),
                    ValuePattern::Phone => is_valid_phone(value),
                    ValuePattern::Custom(re) => re.is_match(value),
                };
                if !matched {
                    return Err(ValueError::PatternMismatch {
                        flag: def.name.clone(),
                        value: value.to_string(),
                    });
                }
            }
        }
    }

    Ok(())
}

/// Structural email validation, stricter than a naive regex.
fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    // No consecutive dots anywhere
    if local.contains("..") || domain.contains("..") {
        return false;
    }

    // Local part: limited character set, bounded by alphanumerics
    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'))
    {
        return false;
    }
    let local_bounds_ok = local.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && local.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    if !local_bounds_ok {
        return false;
    }

    // Domain: letters/digits/dots/hyphens, no leading/trailing '.' or '-',
    // and no label may start or end with a hyphen
    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
    {
        return false;
    }
    if domain.starts_with(['.', '-']) || domain.ends_with(['.', '-']) {
        return false;
    }
    let mut labels = domain.split('.').peekable();
    let mut last_label = "";
    while let Some(label) = labels.next() {
        if label.is_empty() || label.starts_with('-') || label.ends_with('-') {
            return false;
        }
        if labels.peek().is_none() {
            last_label = label;
        }
    }

    // Top-level label must be alphabetic and at least two characters
    last_label.len() >= 2
        && last_label.chars().all(|c| c.is_ascii_alphabetic())
        && domain.contains('.')
}

/// Phone numbers must be exactly `###-###-####`.
fn is_valid_phone(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 12 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        3 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    })
}
