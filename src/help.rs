//! Help and usage text rendering for a context's registered flags.

use crate::context::Context;
use crate::flag::{FlagDefinition, FlagType};
use clap::{Arg, ArgAction, Command};

/// Build a Clap Command from a context (for help/usage rendering only; the
/// tokenizer does its own parsing).
fn build_command(ctx: &Context) -> Command {
    let mut cmd = Command::new(ctx.id().to_string()).disable_help_subcommand(true);

    // Sort by name so rendered help is deterministic
    let mut defs: Vec<&FlagDefinition> = ctx.definitions().collect();
    defs.sort_by(|a, b| a.name.cmp(&b.name));

    for def in defs {
        cmd = cmd.arg(build_arg(def));
    }

    if let Some(rule) = ctx.positional_rule() {
        let mut arg = Arg::new("args")
            .action(ArgAction::Append)
            .num_args(rule.min..)
            .value_name("ARGS");
        if let Some(ref description) = rule.description {
            arg = arg.help(description.clone());
        }
        cmd = cmd.arg(arg);
    }

    cmd
}

fn build_arg(def: &FlagDefinition) -> Arg {
    let mut arg = Arg::new(def.name.clone()).long(def.name.clone());

    if let Some(c) = def.shorthand {
        arg = arg.short(c);
    }
    if let Some(ref description) = def.description {
        arg = arg.help(description.clone());
    }
    if let Some(ref env_var) = def.env_var {
        arg = arg.env(env_var.clone());
    }
    if def.required {
        arg = arg.required(true);
    }

    match def.flag_type {
        FlagType::Bool => {
            arg = arg.action(ArgAction::SetTrue);
        }
        FlagType::Int => {
            arg = arg.action(ArgAction::Set).value_name("INT");
        }
        FlagType::String => {
            arg = arg.action(ArgAction::Set).value_name("VALUE");
            if let Some(ref allowed) = def.allowed_values {
                arg = arg.value_parser(clap::builder::PossibleValuesParser::new(
                    allowed.iter().cloned().collect::<Vec<_>>(),
                ));
            }
        }
    }

    if let Some(ref default) = def.default {
        arg = arg.default_value(default.clone());
    }

    arg
}

/// Render the full help text for a context.
pub fn render_help(ctx: &Context) -> String {
    build_command(ctx).render_long_help().to_string()
}

/// Render the one-line usage string for a context.
pub fn render_usage(ctx: &Context) -> String {
    let mut cmd = build_command(ctx);
    cmd.render_usage().to_string()
}
