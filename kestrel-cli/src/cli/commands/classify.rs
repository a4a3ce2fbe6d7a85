use crate::cli::output::*;
use crate::cli::CommandContext;
use crate::core::classifier::classify_dataset;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Aligned FASTA
    #[arg(short, long, value_name = "FILE")]
    pub aligned: PathBuf,

    /// Normalized metadata table
    #[arg(short, long, value_name = "FILE")]
    pub metadata: PathBuf,

    /// Optional `accession,label` lookup table
    #[arg(short, long, value_name = "FILE")]
    pub lookup: Option<PathBuf>,

    /// Annotated table to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

pub fn run(args: ClassifyArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    action("Classifying aligned records");
    let report = classify_dataset(
        &args.aligned,
        &args.metadata,
        args.lookup.as_deref(),
        &args.output,
        &ctx.config,
    )?;

    stage_summary(&report);
    success(&format!("Wrote {}", describe_file(&args.output)));
    Ok(())
}
