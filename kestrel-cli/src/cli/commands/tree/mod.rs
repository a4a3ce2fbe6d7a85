pub mod annotate;
pub mod convert;

use crate::cli::CommandContext;
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(subcommand)]
    pub command: TreeCommands,
}

#[derive(Subcommand, Debug)]
pub enum TreeCommands {
    /// Convert a NEXUS tree to plain Newick
    Convert(convert::ConvertArgs),

    /// Add name, subtype, host and country annotations parsed from leaf labels
    Annotate(annotate::AnnotateArgs),
}

pub fn run(args: TreeArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    match args.command {
        TreeCommands::Convert(args) => convert::run(args),
        TreeCommands::Annotate(args) => annotate::run(args, ctx),
    }
}
