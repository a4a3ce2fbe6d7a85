use crate::cli::output::*;
use crate::cli::CommandContext;
use crate::core::normalizer::normalize_metadata;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Raw metadata table (CSV, or TSV for .tsv/.tab files)
    #[arg(value_name = "METADATA")]
    pub input: PathBuf,

    /// Normalized table to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

pub fn run(args: NormalizeArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    action(&format!("Normalizing {}", args.input.display()));
    let report = normalize_metadata(&args.input, &args.output, &ctx.config)?;

    stage_summary(&report);
    success(&format!("Wrote {}", describe_file(&args.output)));
    Ok(())
}
