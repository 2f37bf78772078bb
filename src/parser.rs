//! CLI tokenizer: walks argv and produces flag assignments and positionals.

use crate::context::Context;
use crate::flag::{FlagDefinition, FlagType};
use crate::validate::{validate_value, ValueError};
use thiserror::Error;

/// Errors raised while tokenizing a command line.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingValue(String),

    #[error("shorthand '-{0}' takes a value and must be last in a combined block")]
    ShorthandNotLast(char),

    #[error("invalid boolean '{value}' for flag '{flag}': command-line booleans must be literally 'true' or 'false'")]
    BoolLiteralRequired { flag: String, value: String },

    #[error(transparent)]
    Invalid(#[from] ValueError),
}

/// What a completed walk over argv produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliOutcome {
    /// Flag assignments in encounter order, plus positional arguments.
    Parsed {
        assignments: Vec<(String, String)>,
        positionals: Vec<String>,
    },
    /// `--help`/`-h` was seen; parsing stopped there.
    Help,
}

/// Tokenize argv against a context's registered flags.
///
/// Every assigned value has already passed validation when this returns; the
/// whole pass is all-or-nothing. Bool assignments come back canonicalized.
pub fn parse_cli(ctx: &Context, argv: &[String]) -> Result<CliOutcome, ParseError> {
    let mut assignments: Vec<(String, String)> = Vec::new();
    let mut positionals: Vec<String> = Vec::new();
    let mut iter = argv.iter().peekable();
    let mut parsing_flags = true;

    while let Some(token) = iter.next() {
        if parsing_flags && token == "--" {
            parsing_flags = false;
            continue;
        }
        if parsing_flags && (token == "--help" || token == "-h") {
            return Ok(CliOutcome::Help);
        }

        if parsing_flags && token.starts_with("--") && token.len() > 2 {
            parse_long(ctx, &token[2..], &mut iter, &mut assignments)?;
        } else if parsing_flags && token.starts_with('-') && token.len() > 1 {
            parse_shorthand_block(ctx, &token[1..], &mut iter, &mut assignments)?;
        } else {
            positionals.push(token.clone());
        }
    }

    Ok(CliOutcome::Parsed {
        assignments,
        positionals,
    })
}

fn parse_long(
    ctx: &Context,
    option: &str,
    iter: &mut std::iter::Peekable<std::slice::Iter<String>>,
    assignments: &mut Vec<(String, String)>,
) -> Result<(), ParseError> {
    // --name=value form splits on the first '='
    let (name, inline_value) = match option.split_once('=') {
        Some((n, v)) => (n, Some(v)),
        None => (option, None),
    };

    let def = ctx
        .definition(name)
        .ok_or_else(|| ParseError::UnknownFlag(format!("--{}", name)))?;

    let value = match (def.flag_type, inline_value) {
        (FlagType::Bool, Some(v)) => bool_literal(def, v)?.to_string(),
        (FlagType::Bool, None) => {
            // Consume the next token only when it is an explicit boolean
            // literal; otherwise the bare flag means true.
            let explicit = matches!(iter.peek().map(|t| t.as_str()), Some("true" | "false"));
            if explicit {
                match iter.next() {
                    Some(lit) => lit.clone(),
                    None => "true".to_string(),
                }
            } else {
                "true".to_string()
            }
        }
        (_, Some(v)) => {
            validate_value(def, v)?;
            v.to_string()
        }
        (_, None) => take_value(def, &format!("--{}", name), iter)?,
    };

    assignments.push((def.name.clone(), value));
    Ok(())
}

fn parse_shorthand_block(
    ctx: &Context,
    block: &str,
    iter: &mut std::iter::Peekable<std::slice::Iter<String>>,
    assignments: &mut Vec<(String, String)>,
) -> Result<(), ParseError> {
    let chars: Vec<char> = block.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        let def = ctx
            .definition_by_shorthand(*c)
            .ok_or_else(|| ParseError::UnknownFlag(format!("-{}", c)))?;

        if def.flag_type == FlagType::Bool {
            assignments.push((def.name.clone(), "true".to_string()));
            continue;
        }

        // A value-taking shorthand terminates the block
        if i + 1 != chars.len() {
            return Err(ParseError::ShorthandNotLast(*c));
        }
        let value = take_value(def, &format!("-{}", c), iter)?;
        assignments.push((def.name.clone(), value));
    }

    Ok(())
}

/// Consume the mandatory next token as a flag's value.
///
/// A `-`-prefixed token is rejected as a missing value unless it parses as a
/// negative integer, so `--count -5` works while `--count --other` does not.
fn take_value(
    def: &FlagDefinition,
    display: &str,
    iter: &mut std::iter::Peekable<std::slice::Iter<String>>,
) -> Result<String, ParseError> {
    let value = iter
        .next()
        .ok_or_else(|| ParseError::MissingValue(display.to_string()))?;
    if value.starts_with('-') && !is_negative_integer(value) {
        return Err(ParseError::MissingValue(display.to_string()));
    }
    validate_value(def, value)?;
    Ok(value.clone())
}

fn bool_literal<'a>(def: &FlagDefinition, value: &'a str) -> Result<&'a str, ParseError> {
    match value {
        "true" | "false" => Ok(value),
        _ => Err(ParseError::BoolLiteralRequired {
            flag: def.name.clone(),
            value: value.to_string(),
        }),
    }
}

fn is_negative_integer(token: &str) -> bool {
    token.len() > 1
        && token.starts_with('-')
        && token[1..].bytes().all(|b| b.is_ascii_digit())
}
