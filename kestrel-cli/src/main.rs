use clap::Parser;
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod download;

use crate::cli::{Cli, CommandContext, Commands};
use kestrel_core::KestrelError;

fn main() {
    let cli = Cli::parse();

    // KESTREL_LOG wins over -v
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("KESTREL_LOG")
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(exit_code(&e));
    }
}

/// Exit code for the first Kestrel or I/O error in the chain
fn exit_code(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if let Some(e) = cause.downcast_ref::<KestrelError>() {
            return match e {
                KestrelError::Configuration(_) | KestrelError::MissingRequiredField { .. } => 2,
                KestrelError::Io(_) => 3,
                KestrelError::Parse(_)
                | KestrelError::MalformedRecord(_)
                | KestrelError::ExternalTool { .. }
                | KestrelError::MalformedThreshold { .. } => 4,
                KestrelError::Network(_) => 5,
                _ => 1,
            };
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return 3;
        }
    }
    1
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        verbose,
        threads,
        config: config_path,
    } = cli;
    let load = || CommandContext::load(config_path.as_deref(), threads, verbose);

    if verbose > 0 {
        let effective = if threads == 0 { num_cpus::get() } else { threads };
        eprintln!("Using {} aligner threads", effective);
    }

    match command {
        Commands::Config(args) => crate::cli::commands::config::run(args, load),
        Commands::Download(args) => crate::cli::commands::download::run(args, &load()?),
        Commands::Extract(args) => crate::cli::commands::extract::run(args, &load()?),
        Commands::Normalize(args) => crate::cli::commands::normalize::run(args, &load()?),
        Commands::Filter(args) => crate::cli::commands::filter::run(args, &load()?),
        Commands::Align(args) => crate::cli::commands::align::run(args, &load()?),
        Commands::Classify(args) => crate::cli::commands::classify::run(args, &load()?),
        Commands::Export(args) => crate::cli::commands::export::run(args, &load()?),
        Commands::Run(args) => crate::cli::commands::run::run(args, &load()?),
        Commands::Tree(args) => crate::cli::commands::tree::run(args, &load()?),
        Commands::Tools(args) => crate::cli::commands::tools::run(args, &load()?),
    }
}
