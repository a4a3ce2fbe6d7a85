pub mod list;

use crate::cli::CommandContext;
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct ToolsArgs {
    #[command(subcommand)]
    pub command: ToolsCommands,
}

#[derive(Subcommand, Debug)]
pub enum ToolsCommands {
    /// Show where each aligner was found and its version
    List(list::ListArgs),
}

pub fn run(args: ToolsArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    match args.command {
        ToolsCommands::List(args) => list::run(args, ctx),
    }
}
