use crate::cli::output::*;
use crate::core::tree::convert_nexus;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input NEXUS tree
    #[arg(value_name = "TREE")]
    pub input: PathBuf,

    /// Newick file to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Drop branch lengths
    #[arg(long)]
    pub topology_only: bool,
}

pub fn run(args: ConvertArgs) -> anyhow::Result<()> {
    action(&format!("Converting {}", args.input.display()));
    let leaves = convert_nexus(&args.input, &args.output, args.topology_only)?;
    tree_item(true, "Leaves", Some(&format_number(leaves)));
    success(&format!("Wrote {}", describe_file(&args.output)));
    Ok(())
}
