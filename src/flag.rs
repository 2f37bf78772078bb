//! Flag definitions: the immutable per-flag record a context stores.

use regex::Regex;
use serde::Deserialize;

/// The type of value a flag holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlagType {
    /// Boolean, canonicalized to "true"/"false"
    Bool,
    /// Signed integer, kept in string form
    Int,
    /// Any string value
    #[default]
    String,
}

impl FlagType {
    /// The unset sentinel a flag of this type is initialized to.
    pub fn empty_value(self) -> &'static str {
        match self {
            FlagType::Bool => "false",
            FlagType::Int | FlagType::String => "",
        }
    }
}

/// Pattern a string flag's value must match.
///
/// The `email` and `phone` names select built-in structural validation that
/// is stricter than naive regex matching; anything else is compiled as a
/// regular expression.
#[derive(Debug, Clone)]
pub enum ValuePattern {
    Email,
    Phone,
    Custom(Regex),
}

impl ValuePattern {
    /// Parse a pattern string, resolving the built-in names first.
    pub fn parse(pattern: &str) -> Result<ValuePattern, regex::Error> {
        match pattern {
            "email" => Ok(ValuePattern::Email),
            "phone" => Ok(ValuePattern::Phone),
            other => Regex::new(other).map(ValuePattern::Custom),
        }
    }
}

/// Configuration for a single flag, immutable once registered.
#[derive(Debug, Clone)]
pub struct FlagDefinition {
    /// Flag name, unique within its context
    pub name: String,
    /// The value type
    pub flag_type: FlagType,
    /// Help text for this flag
    pub description: Option<String>,
    /// Single-character alias (e.g., 'v' for -v)
    pub shorthand: Option<char>,
    /// Default value applied in the first resolution pass
    pub default: Option<String>,
    /// Finite set of accepted values
    pub allowed_values: Option<Vec<String>>,
    /// Environment variable consulted during resolution
    pub env_var: Option<String>,
    /// Pattern the value must match
    pub pattern: Option<ValuePattern>,
    /// Whether the resolved value must be non-empty
    pub required: bool,
}

impl FlagDefinition {
    /// Create a definition with just a name and type; everything else is
    /// filled in through the builder methods.
    pub fn new(name: impl Into<String>, flag_type: FlagType) -> Self {
        Self {
            name: name.into(),
            flag_type,
            description: None,
            shorthand: None,
            default: None,
            allowed_values: None,
            env_var: None,
            pattern: None,
            required: false,
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn shorthand(mut self, c: char) -> Self {
        self.shorthand = Some(c);
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn allowed_values(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var = Some(name.into());
        self
    }

    pub fn pattern(mut self, pattern: ValuePattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}
