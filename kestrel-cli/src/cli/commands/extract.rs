use crate::cli::output::*;
use crate::cli::CommandContext;
use crate::core::extractor::extract_fasta;
use crate::core::report::MALFORMED;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// JSONL file written by `kestrel download`
    #[arg(value_name = "JSONL")]
    pub input: PathBuf,

    /// FASTA file to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

pub fn run(args: ExtractArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    action(&format!("Extracting sequences from {}", args.input.display()));
    let report = extract_fasta(&args.input, &args.output, &ctx.config)?;

    let skipped = report.dropped_count(MALFORMED);
    if skipped > 0 {
        warning(&format!("Skipped {} unusable lines", format_number(skipped)));
    }
    success(&format!(
        "Wrote {} sequences to {}",
        format_number(report.records_out),
        describe_file(&args.output)
    ));
    Ok(())
}
