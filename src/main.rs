//! shargs - Multi-source flag resolution for shell scripts.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shargs::{program_context_id, render_help, resolve, ContextStore, Manifest, Resolution};
use std::path::PathBuf;

/// Multi-source flag resolution for shell scripts.
#[derive(Parser, Debug)]
#[command(name = "shargs", version, about, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Resolved state as a JSON object
    Json,
    /// Path to a sourceable file of shell export statements
    Exports,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve script arguments against a manifest
    Resolve {
        /// JSON manifest for the target script
        #[arg(long)]
        manifest: String,

        /// Optional `key = value` config file merged below env and CLI
        #[arg(long)]
        config_file: Option<PathBuf>,

        /// How to emit the resolved state
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Environment variable prefix for exports output
        #[arg(long, default_value = "SHARGS_")]
        prefix: String,

        /// Arguments to resolve for the target script
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print help text for the target script
    Help {
        /// JSON manifest for the target script
        #[arg(long)]
        manifest: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            manifest,
            config_file,
            format,
            prefix,
            args,
        } => {
            let manifest =
                Manifest::from_json(&manifest).context("failed to parse manifest JSON")?;

            let mut store = ContextStore::new();
            let id = manifest
                .name
                .clone()
                .unwrap_or_else(program_context_id);
            let ctx = store.acquire(&id);
            manifest.apply(ctx).context("invalid manifest")?;

            let resolution = resolve(ctx, &args, config_file.as_deref())
                .context("failed to resolve arguments")?;

            match resolution {
                Resolution::Help => print!("{}", render_help(ctx)),
                Resolution::Complete(resolved) => match format {
                    OutputFormat::Json => {
                        println!("{}", resolved.to_json().context("failed to encode output")?)
                    }
                    OutputFormat::Exports => {
                        let path = resolved
                            .export_file(&prefix)
                            .context("failed to write export file")?;
                        println!("{}", path.display());
                    }
                },
            }
        }
        Commands::Help { manifest } => {
            let manifest =
                Manifest::from_json(&manifest).context("failed to parse manifest JSON")?;
            let mut store = ContextStore::new();
            let id = manifest
                .name
                .clone()
                .unwrap_or_else(program_context_id);
            let ctx = store.acquire(&id);
            manifest.apply(ctx).context("invalid manifest")?;
            print!("{}", render_help(ctx));
        }
    }

    Ok(())
}
