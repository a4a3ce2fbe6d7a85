pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use kestrel_core::{load_effective_config, Config};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "kestrel",
    version,
    about = "Curation pipeline for BV-BRC viral sequence datasets",
    long_about = "Kestrel turns raw BV-BRC metadata and sequence exports into a normalized, \
                  filtered, aligned and classified dataset, and prepares phylogenetic trees \
                  for Taxonium. Every stage reads and writes plain files, so stages can be run \
                  one at a time or chained with `kestrel run`."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of aligner threads (0 = all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,

    /// Configuration file (defaults to $KESTREL_CONFIG, ./kestrel.toml, then $KESTREL_HOME/config.toml)
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download genome sequences from BV-BRC for a list of accessions
    Download(commands::download::DownloadArgs),

    /// Convert downloaded JSONL records to FASTA
    Extract(commands::extract::ExtractArgs),

    /// Normalize a raw metadata table
    Normalize(commands::normalize::NormalizeArgs),

    /// Keep the sequences that have a normalized metadata row
    Filter(commands::filter::FilterArgs),

    /// Align sequences with MAFFT or MUSCLE
    Align(commands::align::AlignArgs),

    /// Label aligned records from metadata, a lookup table or rules
    Classify(commands::classify::ClassifyArgs),

    /// Write the final dataset table and tree-input FASTA
    Export(commands::export::ExportArgs),

    /// Run every stage from metadata and sequences to the final dataset
    Run(commands::run::RunArgs),

    /// Convert and annotate phylogenetic trees
    Tree(commands::tree::TreeArgs),

    /// Create or inspect the configuration
    Config(commands::config::ConfigArgs),

    /// Inspect the external alignment tools
    Tools(commands::tools::ToolsArgs),
}

/// Settings every command runs with
pub struct CommandContext {
    pub config: Config,
    /// File the configuration was loaded from, if any
    pub config_path: Option<PathBuf>,
    pub verbose: u8,
}

impl CommandContext {
    /// Load the effective configuration and apply command-line overrides
    pub fn load(explicit: Option<&Path>, threads: usize, verbose: u8) -> anyhow::Result<Self> {
        let (mut config, config_path) = load_effective_config(explicit)?;
        if threads > 0 {
            config.alignment.threads = threads;
        }
        Ok(Self {
            config,
            config_path,
            verbose,
        })
    }
}
