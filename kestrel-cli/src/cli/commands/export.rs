use crate::cli::output::*;
use crate::cli::CommandContext;
use crate::core::exporter::export_dataset;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Annotated table from `kestrel classify`
    #[arg(long, value_name = "FILE")]
    pub annotated: PathBuf,

    /// Aligned FASTA
    #[arg(long, value_name = "FILE")]
    pub aligned: PathBuf,

    /// Final dataset table to write
    #[arg(long, value_name = "FILE")]
    pub dataset: PathBuf,

    /// Tree-input FASTA to write
    #[arg(long, value_name = "FILE")]
    pub tree_input: PathBuf,
}

pub fn run(args: ExportArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    action("Exporting dataset");
    let report = export_dataset(
        &args.annotated,
        &args.aligned,
        &args.dataset,
        &args.tree_input,
        &ctx.config,
    )?;

    stage_summary(&report);
    success(&format!("Wrote {}", describe_file(&args.dataset)));
    success(&format!("Wrote {}", describe_file(&args.tree_input)));
    Ok(())
}
