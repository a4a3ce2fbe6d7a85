use crate::cli::output::*;
use crate::cli::CommandContext;
use crate::core::filter::filter_sequences;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Normalized metadata table
    #[arg(short, long, value_name = "FILE")]
    pub metadata: PathBuf,

    /// Raw FASTA (plain or .gz)
    #[arg(short, long, value_name = "FILE")]
    pub sequences: PathBuf,

    /// Filtered FASTA to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

pub fn run(args: FilterArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    action(&format!("Filtering {}", args.sequences.display()));
    let report = filter_sequences(&args.metadata, &args.sequences, &args.output, &ctx.config)?;

    stage_summary(&report);
    success(&format!("Wrote {}", describe_file(&args.output)));
    Ok(())
}
