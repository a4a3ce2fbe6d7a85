use super::align::AlignerOptions;
use crate::cli::output::*;
use crate::cli::CommandContext;
use crate::core::{run_pipeline, PipelineInputs, PipelinePaths, Stage};
use clap::Args;
use kestrel_tools::MultipleAligner;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Raw metadata table
    #[arg(short, long, value_name = "FILE")]
    pub metadata: PathBuf,

    /// Raw FASTA (plain or .gz)
    #[arg(short, long, value_name = "FILE")]
    pub sequences: PathBuf,

    /// Optional `accession,label` lookup table for classification
    #[arg(short, long, value_name = "FILE")]
    pub lookup: Option<PathBuf>,

    /// Directory for every stage output
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Resume at this stage, reusing earlier outputs in the output directory
    #[arg(long, value_enum, default_value_t = Stage::Normalize)]
    pub from: Stage,

    #[command(flatten)]
    pub aligner: AlignerOptions,
}

pub fn run(args: RunArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    section_header("Kestrel pipeline");
    if let Some(path) = &ctx.config_path {
        info(&format!("Configuration: {}", path.display()));
    }
    if args.from != Stage::Normalize {
        info(&format!("Resuming at stage '{}'", args.from));
    }

    // Resolve the aligner up front so a missing binary fails before any stage runs
    let aligner: Option<Box<dyn MultipleAligner>> = if args.from <= Stage::Align {
        Some(args.aligner.build(&ctx.config.alignment)?)
    } else {
        None
    };

    let inputs = PipelineInputs {
        metadata: &args.metadata,
        sequences: &args.sequences,
        lookup: args.lookup.as_deref(),
    };
    let manifest = run_pipeline(
        inputs,
        &args.output_dir,
        args.from,
        &ctx.config,
        ctx.config_path.as_deref(),
        aligner.as_deref(),
    )?;

    println!("{}", stage_table(&manifest.stages));
    if ctx.verbose > 0 {
        for report in &manifest.stages {
            section_header(&report.stage);
            stage_summary(report);
        }
    }

    let paths = PipelinePaths::new(&args.output_dir);
    section_header("Outputs");
    tree_item(false, "Dataset", Some(&describe_file(&paths.dataset)));
    tree_item(false, "Tree input", Some(&describe_file(&paths.tree_input)));
    tree_item(true, "Manifest", Some(&paths.manifest.display().to_string()));
    success("Pipeline complete");
    Ok(())
}
