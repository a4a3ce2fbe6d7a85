use crate::cli::output::*;
use crate::cli::CommandContext;
use crate::core::tree::annotate_file;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Newick tree whose leaves carry `accession|strain|subtype|host[|location]` labels
    #[arg(value_name = "TREE")]
    pub input: PathBuf,

    /// Annotated Newick file to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Omit the trailing comma Taxonium needs inside comments
    #[arg(long)]
    pub no_taxonium_compat: bool,
}

pub fn run(args: AnnotateArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let compat = ctx.config.tree.taxonium_compat && !args.no_taxonium_compat;
    action(&format!("Annotating {}", args.input.display()));

    let summary = annotate_file(&args.input, &args.output, compat)?;
    tree_item(false, "Annotated leaves", Some(&format_number(summary.annotated)));
    tree_item(true, "Unchanged leaves", Some(&format_number(summary.unchanged)));
    if summary.unchanged > 0 {
        warning("Some leaf labels did not have 4 or 5 '|' separated fields");
    }
    success(&format!("Wrote {}", describe_file(&args.output)));
    Ok(())
}
