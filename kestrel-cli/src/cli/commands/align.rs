use crate::cli::output::*;
use crate::cli::CommandContext;
use crate::core::aligner::align_fasta;
use clap::Args;
use kestrel_core::config::AlignmentConfig;
use kestrel_tools::{MultipleAligner, ToolManager};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct AlignArgs {
    /// Filtered FASTA
    #[arg(value_name = "FASTA")]
    pub input: PathBuf,

    /// Aligned FASTA to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    #[command(flatten)]
    pub aligner: AlignerOptions,
}

/// Overrides of the `[alignment]` section
#[derive(Args, Debug, Default)]
pub struct AlignerOptions {
    /// Aligner to use (mafft, muscle)
    #[arg(long)]
    pub tool: Option<String>,

    /// Path to the aligner binary
    #[arg(long, value_name = "PATH")]
    pub binary: Option<PathBuf>,
}

impl AlignerOptions {
    /// Alignment settings with the command-line overrides applied
    pub fn apply(&self, settings: &AlignmentConfig) -> AlignmentConfig {
        let mut settings = settings.clone();
        if let Some(tool) = &self.tool {
            settings.tool = tool.clone();
            // A binary configured for another tool does not carry over
            settings.binary = None;
        }
        if let Some(binary) = &self.binary {
            settings.binary = Some(binary.display().to_string());
        }
        settings
    }

    pub fn build(&self, settings: &AlignmentConfig) -> anyhow::Result<Box<dyn MultipleAligner>> {
        ToolManager::new().aligner_for(&self.apply(settings))
    }
}

pub fn run(args: AlignArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let aligner = args.aligner.build(&ctx.config.alignment)?;
    action(&format!(
        "Aligning {} with {}",
        args.input.display(),
        aligner.name()
    ));

    let report = align_fasta(
        &args.input,
        &args.output,
        aligner.as_ref(),
        ctx.config.export.fasta_line_width,
    )?;

    stage_summary(&report);
    success(&format!("Wrote {}", describe_file(&args.output)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let mut settings = AlignmentConfig::default();
        settings.binary = Some("/opt/mafft/bin/mafft".to_string());

        let options = AlignerOptions {
            tool: Some("muscle".to_string()),
            binary: None,
        };
        let applied = options.apply(&settings);
        assert_eq!(applied.tool, "muscle");
        assert_eq!(applied.binary, None);

        let options = AlignerOptions {
            tool: None,
            binary: Some(PathBuf::from("/usr/local/bin/mafft")),
        };
        assert_eq!(
            options.apply(&settings).binary.as_deref(),
            Some("/usr/local/bin/mafft")
        );
    }
}
