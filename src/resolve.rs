//! Four-pass value resolution: defaults, config file, environment, CLI.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

use crate::config::{self, ConfigError};
use crate::context::Context;
use crate::flag::{FlagDefinition, FlagType};
use crate::output::ResolvedArgs;
use crate::parser::{self, CliOutcome, ParseError};
use crate::validate::{normalize_bool, validate_value, ValueError};

/// Errors that abort a resolution attempt.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cli(#[from] ParseError),

    #[error(transparent)]
    Invalid(#[from] ValueError),

    #[error("mutually exclusive flags set together: {}", .flags.join(", "))]
    MutexViolation { flags: Vec<String> },

    #[error("expected at least {required} positional argument(s) ({}), got {actual}", .description.as_deref().unwrap_or("arguments"))]
    MissingPositionals {
        required: usize,
        actual: usize,
        description: Option<String>,
    },

    #[error("missing required flag: {0}")]
    MissingRequired(String),
}

/// Outcome of a resolution attempt that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// All four passes and the global checks succeeded.
    Complete(ResolvedArgs),
    /// `--help`/`-h` was seen; nothing was committed.
    Help,
}

/// Resolve a context's flags from defaults, an optional config file, the
/// process environment and argv, in that precedence order (lowest first).
pub fn resolve(
    ctx: &mut Context,
    argv: &[String],
    config_file: Option<&Path>,
) -> Result<Resolution, ResolveError> {
    let env: HashMap<String, String> = std::env::vars().collect();
    resolve_with_env(ctx, argv, config_file, &env)
}

/// Like [`resolve`], but reading environment variables from an explicit
/// snapshot instead of the process environment.
///
/// Resolution is all-or-nothing: values are accumulated in a scratch map and
/// committed to the context only when every pass and every global check has
/// succeeded. On error the context's live values are untouched.
pub fn resolve_with_env(
    ctx: &mut Context,
    argv: &[String],
    config_file: Option<&Path>,
    env: &HashMap<String, String>,
) -> Result<Resolution, ResolveError> {
    let mut values: BTreeMap<String, String> = BTreeMap::new();

    // Pass 1: type-appropriate empty value, then the declared default
    for def in ctx.definitions() {
        let value = match def.default {
            Some(ref default) => canonical(def, default),
            None => def.flag_type.empty_value().to_string(),
        };
        values.insert(def.name.clone(), value);
    }

    // Pass 2: config file, only keys naming a registered flag
    if let Some(path) = config_file {
        for (key, value) in config::load_assignments(path)? {
            if let Some(def) = ctx.definition(&key) {
                validate_value(def, &value)?;
                values.insert(key, canonical(def, &value));
            }
        }
    }

    // Pass 3: environment variables, set and non-empty only
    for def in ctx.definitions() {
        if let Some(ref var) = def.env_var {
            if let Some(value) = env.get(var).filter(|v| !v.is_empty()) {
                validate_value(def, value)?;
                values.insert(def.name.clone(), canonical(def, value));
            }
        }
    }

    // Pass 4: command line (values come back validated and canonical)
    let positionals = match parser::parse_cli(ctx, argv)? {
        CliOutcome::Help => return Ok(Resolution::Help),
        CliOutcome::Parsed {
            assignments,
            positionals,
        } => {
            for (name, value) in assignments {
                values.insert(name, value);
            }
            positionals
        }
    };

    check_mutex(ctx, &values)?;
    check_positionals(ctx, &positionals)?;
    check_required(ctx, &values)?;

    ctx.store_resolution(&values, &positionals);
    Ok(Resolution::Complete(ResolvedArgs {
        flags: values,
        positionals,
    }))
}

fn check_mutex(ctx: &Context, values: &BTreeMap<String, String>) -> Result<(), ResolveError> {
    for group in ctx.mutex_groups() {
        let set: Vec<String> = group
            .iter()
            .filter(|name| values.get(*name).map(String::as_str) == Some("true"))
            .cloned()
            .collect();
        if set.len() > 1 {
            return Err(ResolveError::MutexViolation { flags: set });
        }
    }
    Ok(())
}

fn check_positionals(ctx: &Context, positionals: &[String]) -> Result<(), ResolveError> {
    if let Some(rule) = ctx.positional_rule() {
        if positionals.len() < rule.min {
            return Err(ResolveError::MissingPositionals {
                required: rule.min,
                actual: positionals.len(),
                description: rule.description.clone(),
            });
        }
    }
    Ok(())
}

fn check_required(ctx: &Context, values: &BTreeMap<String, String>) -> Result<(), ResolveError> {
    for def in ctx.definitions() {
        if def.required && values.get(&def.name).is_some_and(|v| v.is_empty()) {
            return Err(ResolveError::MissingRequired(def.name.clone()));
        }
    }
    Ok(())
}

/// Canonical stored form of a validated value. Booleans are normalized to
/// the "true"/"false" literals; everything else is stored as received.
fn canonical(def: &FlagDefinition, value: &str) -> String {
    if def.flag_type == FlagType::Bool {
        if let Some(b) = normalize_bool(value) {
            return b.to_string();
        }
    }
    value.to_string()
}
