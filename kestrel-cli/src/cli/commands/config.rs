use crate::cli::output::*;
use crate::cli::CommandContext;
use clap::{Args, Subcommand, ValueEnum};
use kestrel_core::config::default_config;
use kestrel_core::{save_config, KestrelError};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a configuration file with every default spelled out
    Init {
        #[arg(default_value = "kestrel.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show {
        #[arg(long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

/// `config init` has to work while the existing configuration is broken,
/// so the context is only loaded for `show`.
pub fn run(
    args: ConfigArgs,
    load: impl FnOnce() -> anyhow::Result<CommandContext>,
) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => init(&path, force),
        ConfigCommands::Show { format } => show(&load()?, format),
    }
}

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        return Err(KestrelError::Configuration(format!(
            "{} already exists; use --force to overwrite",
            path.display()
        ))
        .into());
    }
    save_config(path, &default_config())?;
    success(&format!("Wrote default configuration to {}", path.display()));
    Ok(())
}

fn show(ctx: &CommandContext, format: ConfigFormat) -> anyhow::Result<()> {
    match format {
        ConfigFormat::Toml => {
            match &ctx.config_path {
                Some(path) => println!("# Loaded from {}", path.display()),
                None => println!("# Built-in defaults"),
            }
            print!("{}", toml::to_string_pretty(&ctx.config)?);
        }
        ConfigFormat::Json => println!("{}", serde_json::to_string_pretty(&ctx.config)?),
    }
    Ok(())
}
