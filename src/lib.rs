//! shargs - Multi-source flag resolution for shell scripts.
//!
//! This library resolves a flat set of named flags and an ordered list of
//! positional arguments from four sources in strict precedence order:
//! command line > environment > config file > default. Flags live in
//! isolated contexts, values are validated per type and constraint, and the
//! final state exports as JSON or shell statements.

pub mod config;
pub mod context;
pub mod flag;
pub mod help;
pub mod manifest;
pub mod output;
pub mod parser;
pub mod resolve;
pub mod validate;

pub use config::{load_assignments, parse_assignments, ConfigError};
pub use context::{
    program_context_id, Context, ContextError, ContextStore, PositionalRule, RegistryError,
};
pub use flag::{FlagDefinition, FlagType, ValuePattern};
pub use help::{render_help, render_usage};
pub use manifest::{Manifest, ManifestError};
pub use output::ResolvedArgs;
pub use parser::{parse_cli, CliOutcome, ParseError};
pub use resolve::{resolve, resolve_with_env, Resolution, ResolveError};
pub use validate::{normalize_bool, validate_value, ValueError};
