//! Contexts: isolated flag namespaces, and the store that manages them.

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::flag::{FlagDefinition, FlagType};
use crate::validate::{validate_value, ValueError};

/// Errors raised while registering flags, mutex groups or positional rules.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid flag name '{0}': must start with a letter and contain only letters, digits, '_' or '-'")]
    InvalidFlagName(String),

    #[error("duplicate flag: {0}")]
    DuplicateFlag(String),

    #[error("duplicate shorthand '-{shorthand}': already claimed by --{claimed_by}")]
    DuplicateShorthand { shorthand: char, claimed_by: String },

    #[error("invalid environment variable name '{0}': must be uppercase letters, digits or '_' starting with a letter")]
    InvalidEnvVarName(String),

    #[error("invalid default for flag '{flag}': {source}")]
    InvalidDefault { flag: String, source: ValueError },

    #[error("unknown flag '{0}' in mutex group")]
    UnknownMutexFlag(String),

    #[error("mutex group member '{0}' is not a bool flag")]
    NonBoolMutexFlag(String),

    #[error("a positional requirement is already registered for this context")]
    DuplicatePositionalRule,
}

/// Errors raised by the context store.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("duplicate context: {0}")]
    Duplicate(String),

    #[error("context not found: {0}")]
    NotFound(String),

    #[error("no current context")]
    NoCurrent,
}

/// Minimum positional-argument count for a context, with an optional
/// human-readable description of what the positionals are.
#[derive(Debug, Clone)]
pub struct PositionalRule {
    pub min: usize,
    pub description: Option<String>,
}

/// A registered flag together with its live value.
#[derive(Debug, Clone)]
pub(crate) struct Flag {
    pub def: FlagDefinition,
    pub value: String,
}

/// An isolated namespace of flag definitions and resolved state.
#[derive(Debug)]
pub struct Context {
    id: String,
    flags: HashMap<String, Flag>,
    shorthands: HashMap<char, String>,
    mutex_groups: Vec<Vec<String>>,
    positional_rule: Option<PositionalRule>,
    positionals: Vec<String>,
}

impl Context {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            flags: HashMap::new(),
            shorthands: HashMap::new(),
            mutex_groups: Vec::new(),
            positional_rule: None,
            positionals: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Register a flag definition.
    ///
    /// Validates name syntax, shorthand uniqueness, env-var name syntax and
    /// (when present) the default value, in that order. The flag's live value
    /// is initialized to its type's unset sentinel.
    pub fn register(&mut self, def: FlagDefinition) -> Result<(), RegistryError> {
        if !is_valid_flag_name(&def.name) {
            return Err(RegistryError::InvalidFlagName(def.name));
        }
        if self.flags.contains_key(&def.name) {
            return Err(RegistryError::DuplicateFlag(def.name));
        }
        if let Some(c) = def.shorthand {
            if let Some(claimed_by) = self.shorthands.get(&c) {
                return Err(RegistryError::DuplicateShorthand {
                    shorthand: c,
                    claimed_by: claimed_by.clone(),
                });
            }
        }
        if let Some(ref env_var) = def.env_var {
            if !is_valid_env_var_name(env_var) {
                return Err(RegistryError::InvalidEnvVarName(env_var.clone()));
            }
        }
        if let Some(ref default) = def.default {
            validate_value(&def, default).map_err(|source| RegistryError::InvalidDefault {
                flag: def.name.clone(),
                source,
            })?;
        }

        if let Some(c) = def.shorthand {
            self.shorthands.insert(c, def.name.clone());
        }
        let value = def.flag_type.empty_value().to_string();
        self.flags.insert(def.name.clone(), Flag { def, value });
        Ok(())
    }

    /// Add a mutual-exclusion group of boolean flags.
    ///
    /// Every member must already be registered as a bool flag. A flag may
    /// belong to multiple groups.
    pub fn add_mutex_group(
        &mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<(), RegistryError> {
        let group: Vec<String> = names.into_iter().map(Into::into).collect();
        for name in &group {
            match self.flags.get(name) {
                None => return Err(RegistryError::UnknownMutexFlag(name.clone())),
                Some(flag) if flag.def.flag_type != FlagType::Bool => {
                    return Err(RegistryError::NonBoolMutexFlag(name.clone()))
                }
                Some(_) => {}
            }
        }
        self.mutex_groups.push(group);
        Ok(())
    }

    /// Require a minimum number of positional arguments.
    ///
    /// At most one rule per context; a second registration is an error.
    pub fn require_positionals(
        &mut self,
        min: usize,
        description: Option<String>,
    ) -> Result<(), RegistryError> {
        if self.positional_rule.is_some() {
            return Err(RegistryError::DuplicatePositionalRule);
        }
        self.positional_rule = Some(PositionalRule { min, description });
        Ok(())
    }

    /// Current value of a flag, if registered.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.flags.get(name).map(|f| f.value.as_str())
    }

    /// Positional arguments collected by the last successful resolution.
    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    /// Definition of a registered flag.
    pub fn definition(&self, name: &str) -> Option<&FlagDefinition> {
        self.flags.get(name).map(|f| &f.def)
    }

    /// Definition of the flag claiming a shorthand character.
    pub fn definition_by_shorthand(&self, c: char) -> Option<&FlagDefinition> {
        self.shorthands.get(&c).and_then(|name| self.definition(name))
    }

    /// All registered definitions, in arbitrary order.
    pub fn definitions(&self) -> impl Iterator<Item = &FlagDefinition> {
        self.flags.values().map(|f| &f.def)
    }

    pub fn mutex_groups(&self) -> &[Vec<String>] {
        &self.mutex_groups
    }

    pub fn positional_rule(&self) -> Option<&PositionalRule> {
        self.positional_rule.as_ref()
    }

    /// Commit a completed resolution into the live values.
    pub(crate) fn store_resolution(&mut self, values: &BTreeMap<String, String>, positionals: &[String]) {
        for (name, value) in values {
            if let Some(flag) = self.flags.get_mut(name) {
                flag.value = value.clone();
            }
        }
        self.positionals = positionals.to_vec();
    }
}

/// Registry of contexts, keyed by id, with a "current" pointer.
///
/// All mutation goes through the handles these methods return; the store
/// itself only tracks which contexts exist and which one is current.
#[derive(Debug, Default)]
pub struct ContextStore {
    contexts: HashMap<String, Context>,
    current: Option<String>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context, failing if the id is already taken. The new context
    /// becomes current.
    pub fn create(&mut self, id: &str) -> Result<&mut Context, ContextError> {
        if self.contexts.contains_key(id) {
            return Err(ContextError::Duplicate(id.to_string()));
        }
        self.contexts.insert(id.to_string(), Context::new(id));
        self.current = Some(id.to_string());
        // Just inserted above
        self.contexts
            .get_mut(id)
            .ok_or_else(|| ContextError::NotFound(id.to_string()))
    }

    /// Get-or-create a context; idempotent. The context becomes current.
    pub fn acquire(&mut self, id: &str) -> &mut Context {
        self.current = Some(id.to_string());
        self.contexts
            .entry(id.to_string())
            .or_insert_with(|| Context::new(id))
    }

    /// Get-or-create the context derived from the program name.
    pub fn acquire_for_program(&mut self) -> &mut Context {
        let id = program_context_id();
        self.acquire(&id)
    }

    /// Destroy a context, releasing all its state. Destroying the current
    /// context clears the current pointer.
    pub fn destroy(&mut self, id: &str) -> Result<(), ContextError> {
        if self.contexts.remove(id).is_none() {
            return Err(ContextError::NotFound(id.to_string()));
        }
        if self.current.as_deref() == Some(id) {
            self.current = None;
        }
        Ok(())
    }

    pub fn current(&self) -> Result<&Context, ContextError> {
        self.current
            .as_deref()
            .and_then(|id| self.contexts.get(id))
            .ok_or(ContextError::NoCurrent)
    }

    pub fn current_mut(&mut self) -> Result<&mut Context, ContextError> {
        match self.current.as_deref() {
            Some(id) if self.contexts.contains_key(id) => {
                let id = id.to_string();
                self.contexts
                    .get_mut(&id)
                    .ok_or(ContextError::NoCurrent)
            }
            _ => Err(ContextError::NoCurrent),
        }
    }

    pub fn get(&self, id: &str) -> Result<&Context, ContextError> {
        self.contexts
            .get(id)
            .ok_or_else(|| ContextError::NotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Context, ContextError> {
        self.contexts
            .get_mut(id)
            .ok_or_else(|| ContextError::NotFound(id.to_string()))
    }
}

/// Derive a context id from the running program's name.
pub fn program_context_id() -> String {
    std::env::args()
        .next()
        .as_deref()
        .map(std::path::Path::new)
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "main".to_string())
}

fn is_valid_flag_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_valid_env_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::{FlagDefinition, FlagType};

    fn bool_flag(name: &str) -> FlagDefinition {
        FlagDefinition::new(name, FlagType::Bool)
    }

    #[test]
    fn test_register_initializes_sentinel() {
        let mut store = ContextStore::new();
        let ctx = store.acquire("test");
        ctx.register(bool_flag("verbose")).unwrap();
        ctx.register(FlagDefinition::new("count", FlagType::Int)).unwrap();
        ctx.register(FlagDefinition::new("name", FlagType::String)).unwrap();

        assert_eq!(ctx.get("verbose"), Some("false"));
        assert_eq!(ctx.get("count"), Some(""));
        assert_eq!(ctx.get("name"), Some(""));
        assert_eq!(ctx.get("missing"), None);
    }

    #[test]
    fn test_register_rejects_bad_names() {
        let mut store = ContextStore::new();
        let ctx = store.acquire("test");
        for bad in ["", "1flag", "-flag", "_flag", "fla g", "fl@g"] {
            let result = ctx.register(bool_flag(bad));
            assert!(
                matches!(result, Err(RegistryError::InvalidFlagName(_))),
                "expected '{}' to be rejected",
                bad
            );
        }
        // Hyphens, underscores and digits are fine after the first letter
        ctx.register(bool_flag("dry-run_2")).unwrap();
    }

    #[test]
    fn test_register_rejects_duplicate_name() {
        let mut store = ContextStore::new();
        let ctx = store.acquire("test");
        ctx.register(bool_flag("verbose")).unwrap();
        let result = ctx.register(bool_flag("verbose"));
        assert!(matches!(result, Err(RegistryError::DuplicateFlag(name)) if name == "verbose"));
    }

    #[test]
    fn test_register_rejects_duplicate_shorthand() {
        let mut store = ContextStore::new();
        let ctx = store.acquire("test");
        ctx.register(bool_flag("verbose").shorthand('v')).unwrap();
        let result = ctx.register(bool_flag("version").shorthand('v'));
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateShorthand { shorthand: 'v', ref claimed_by }) if claimed_by == "verbose"
        ));
    }

    #[test]
    fn test_register_rejects_bad_env_var() {
        let mut store = ContextStore::new();
        let ctx = store.acquire("test");
        for (i, bad) in ["lower", "1VAR", "_VAR", "MY-VAR", ""].iter().enumerate() {
            let result = ctx.register(
                FlagDefinition::new(format!("flag{}", i), FlagType::String).env_var(*bad),
            );
            assert!(
                matches!(result, Err(RegistryError::InvalidEnvVarName(_))),
                "expected env var '{}' to be rejected",
                bad
            );
        }
        ctx.register(FlagDefinition::new("ok", FlagType::String).env_var("MY_VAR_2"))
            .unwrap();
    }

    #[test]
    fn test_register_rejects_invalid_default() {
        let mut store = ContextStore::new();
        let ctx = store.acquire("test");
        let result = ctx.register(FlagDefinition::new("count", FlagType::Int).default_value("five"));
        assert!(matches!(
            result,
            Err(RegistryError::InvalidDefault { ref flag, .. }) if flag == "count"
        ));

        let result = ctx.register(
            FlagDefinition::new("mode", FlagType::String)
                .allowed_values(["fast", "slow"])
                .default_value("medium"),
        );
        assert!(matches!(result, Err(RegistryError::InvalidDefault { .. })));
    }

    #[test]
    fn test_failed_registration_leaves_no_trace() {
        let mut store = ContextStore::new();
        let ctx = store.acquire("test");
        let result = ctx.register(
            FlagDefinition::new("count", FlagType::Int)
                .shorthand('c')
                .default_value("oops"),
        );
        assert!(result.is_err());
        // Shorthand must not be claimed by the rejected flag
        ctx.register(bool_flag("check").shorthand('c')).unwrap();
    }

    #[test]
    fn test_mutex_group_member_checks() {
        let mut store = ContextStore::new();
        let ctx = store.acquire("test");
        ctx.register(bool_flag("start")).unwrap();
        ctx.register(bool_flag("stop")).unwrap();
        ctx.register(FlagDefinition::new("mode", FlagType::String)).unwrap();

        ctx.add_mutex_group(["start", "stop"]).unwrap();

        let result = ctx.add_mutex_group(["start", "missing"]);
        assert!(matches!(result, Err(RegistryError::UnknownMutexFlag(name)) if name == "missing"));

        let result = ctx.add_mutex_group(["start", "mode"]);
        assert!(matches!(result, Err(RegistryError::NonBoolMutexFlag(name)) if name == "mode"));
    }

    #[test]
    fn test_positional_rule_registered_once() {
        let mut store = ContextStore::new();
        let ctx = store.acquire("test");
        ctx.require_positionals(2, Some("input files".to_string())).unwrap();
        let result = ctx.require_positionals(3, None);
        assert!(matches!(result, Err(RegistryError::DuplicatePositionalRule)));
        // The original rule is untouched
        assert_eq!(ctx.positional_rule().map(|r| r.min), Some(2));
    }

    #[test]
    fn test_create_rejects_duplicate() {
        let mut store = ContextStore::new();
        store.create("one").unwrap();
        let result = store.create("one");
        assert!(matches!(result, Err(ContextError::Duplicate(id)) if id == "one"));
    }

    #[test]
    fn test_acquire_is_idempotent() {
        let mut store = ContextStore::new();
        store.acquire("auto").register(bool_flag("verbose")).unwrap();
        // Second acquire reuses the existing context instead of erroring
        let ctx = store.acquire("auto");
        assert_eq!(ctx.get("verbose"), Some("false"));
    }

    #[test]
    fn test_destroy_clears_current() {
        let mut store = ContextStore::new();
        store.create("one").unwrap();
        assert_eq!(store.current().unwrap().id(), "one");

        store.destroy("one").unwrap();
        assert!(matches!(store.current(), Err(ContextError::NoCurrent)));
        assert!(matches!(store.destroy("one"), Err(ContextError::NotFound(_))));
    }

    #[test]
    fn test_destroy_other_keeps_current() {
        let mut store = ContextStore::new();
        store.create("one").unwrap();
        store.create("two").unwrap();
        store.destroy("one").unwrap();
        assert_eq!(store.current().unwrap().id(), "two");
    }

    #[test]
    fn test_contexts_are_isolated() {
        let mut store = ContextStore::new();
        store
            .acquire("a")
            .register(bool_flag("verbose").shorthand('v'))
            .unwrap();
        store
            .acquire("b")
            .register(bool_flag("verbose").shorthand('x'))
            .unwrap();

        let a = store.get("a").unwrap();
        let b = store.get("b").unwrap();
        assert_eq!(a.definition("verbose").unwrap().shorthand, Some('v'));
        assert_eq!(b.definition("verbose").unwrap().shorthand, Some('x'));
        assert!(a.definition_by_shorthand('x').is_none());
    }
}
