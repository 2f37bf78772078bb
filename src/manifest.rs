//! JSON manifest describing a flag set, so shell scripts can drive the
//! engine through the binary.

use serde::Deserialize;
use thiserror::Error;

use crate::context::{Context, RegistryError};
use crate::flag::{FlagDefinition, FlagType, ValuePattern};

/// Errors raised while parsing or applying a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to parse manifest JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid shorthand '{0}': must be a single character")]
    InvalidShorthand(String),

    #[error("invalid pattern for flag '{flag}': {source}")]
    InvalidPattern { flag: String, source: regex::Error },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// One flag entry in a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct FlagEntry {
    pub name: String,
    #[serde(rename = "type", default)]
    pub flag_type: FlagType,
    pub description: Option<String>,
    pub shorthand: Option<String>,
    pub default: Option<String>,
    pub allowed_values: Option<Vec<String>>,
    pub env_var: Option<String>,
    /// "email", "phone", or a regular expression
    pub pattern: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// Positional-argument requirement in a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionalEntry {
    pub min: usize,
    pub description: Option<String>,
}

/// Top-level manifest for a target script.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Context id; falls back to the program-derived id when absent
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub flags: Vec<FlagEntry>,
    #[serde(default)]
    pub mutex_groups: Vec<Vec<String>>,
    pub positionals: Option<PositionalEntry>,
}

impl Manifest {
    /// Parse a JSON string into a Manifest.
    pub fn from_json(json: &str) -> Result<Manifest, ManifestError> {
        let manifest: Manifest = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Register everything this manifest describes into a context.
    pub fn apply(&self, ctx: &mut Context) -> Result<(), ManifestError> {
        for entry in &self.flags {
            ctx.register(entry.to_definition()?)?;
        }
        for group in &self.mutex_groups {
            ctx.add_mutex_group(group.iter().cloned())?;
        }
        if let Some(ref rule) = self.positionals {
            ctx.require_positionals(rule.min, rule.description.clone())?;
        }
        Ok(())
    }
}

impl FlagEntry {
    fn to_definition(&self) -> Result<FlagDefinition, ManifestError> {
        let mut def = FlagDefinition::new(self.name.clone(), self.flag_type);
        def.description = self.description.clone();
        def.default = self.default.clone();
        def.allowed_values = self.allowed_values.clone();
        def.env_var = self.env_var.clone();
        def.required = self.required;

        if let Some(ref shorthand) = self.shorthand {
            let mut chars = shorthand.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => def.shorthand = Some(c),
                _ => return Err(ManifestError::InvalidShorthand(shorthand.clone())),
            }
        }
        if let Some(ref pattern) = self.pattern {
            def.pattern = Some(ValuePattern::parse(pattern).map_err(|source| {
                ManifestError::InvalidPattern {
                    flag: self.name.clone(),
                    source,
                }
            })?);
        }

        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextStore;

    #[test]
    fn test_parse_full_manifest() {
        let json = r#"{
            "name": "myscript",
            "description": "My script",
            "flags": [
                {"name": "verbose", "type": "bool", "shorthand": "v", "description": "Verbose output"},
                {"name": "count", "type": "int", "default": "1", "env_var": "MYSCRIPT_COUNT"},
                {"name": "mode", "allowed_values": ["fast", "slow"], "required": true},
                {"name": "contact", "pattern": "email"}
            ],
            "mutex_groups": [["verbose"]],
            "positionals": {"min": 1, "description": "input files"}
        }"#;

        let manifest = Manifest::from_json(json).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("myscript"));
        assert_eq!(manifest.flags.len(), 4);
        assert_eq!(manifest.flags[0].flag_type, FlagType::Bool);
        // Type defaults to string when omitted
        assert_eq!(manifest.flags[2].flag_type, FlagType::String);

        let mut store = ContextStore::new();
        let ctx = store.acquire("myscript");
        manifest.apply(ctx).unwrap();

        assert_eq!(ctx.definition("verbose").unwrap().shorthand, Some('v'));
        assert_eq!(ctx.definition("count").unwrap().default.as_deref(), Some("1"));
        assert!(ctx.definition("mode").unwrap().required);
        assert!(matches!(
            ctx.definition("contact").unwrap().pattern,
            Some(ValuePattern::Email)
        ));
        assert_eq!(ctx.positional_rule().map(|r| r.min), Some(1));
    }

    #[test]
    fn test_minimal_manifest() {
        let manifest = Manifest::from_json(r#"{}"#).unwrap();
        assert!(manifest.name.is_none());
        assert!(manifest.flags.is_empty());
        assert!(manifest.mutex_groups.is_empty());
        assert!(manifest.positionals.is_none());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Manifest::from_json("{not json"),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = Manifest::from_json(
            r#"{"flags": [{"name": "x", "type": "float"}]}"#,
        );
        assert!(matches!(result, Err(ManifestError::Parse(_))));
    }

    #[test]
    fn test_multichar_shorthand_rejected() {
        let manifest = Manifest::from_json(
            r#"{"flags": [{"name": "verbose", "type": "bool", "shorthand": "vv"}]}"#,
        )
        .unwrap();
        let mut store = ContextStore::new();
        let result = manifest.apply(store.acquire("test"));
        assert!(matches!(result, Err(ManifestError::InvalidShorthand(s)) if s == "vv"));
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let manifest = Manifest::from_json(
            r#"{"flags": [{"name": "id", "pattern": "[unclosed"}]}"#,
        )
        .unwrap();
        let mut store = ContextStore::new();
        let result = manifest.apply(store.acquire("test"));
        assert!(matches!(
            result,
            Err(ManifestError::InvalidPattern { ref flag, .. }) if flag == "id"
        ));
    }

    #[test]
    fn test_registry_errors_propagate() {
        let manifest = Manifest::from_json(
            r#"{"flags": [
                {"name": "dup", "type": "bool"},
                {"name": "dup", "type": "bool"}
            ]}"#,
        )
        .unwrap();
        let mut store = ContextStore::new();
        let result = manifest.apply(store.acquire("test"));
        assert!(matches!(
            result,
            Err(ManifestError::Registry(RegistryError::DuplicateFlag(ref name))) if name == "dup"
        ));
    }

    #[test]
    fn test_mutex_group_from_manifest() {
        let manifest = Manifest::from_json(
            r#"{
                "flags": [
                    {"name": "start", "type": "bool"},
                    {"name": "stop", "type": "bool"}
                ],
                "mutex_groups": [["start", "stop"]]
            }"#,
        )
        .unwrap();
        let mut store = ContextStore::new();
        let ctx = store.acquire("test");
        manifest.apply(ctx).unwrap();
        assert_eq!(ctx.mutex_groups().len(), 1);
    }
}
