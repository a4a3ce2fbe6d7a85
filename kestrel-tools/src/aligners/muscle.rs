//! MUSCLE 5 aligner implementation

use super::{effective_threads, read_version, run_tool, scratch_dir, write_input};
use crate::traits::MultipleAligner;
use crate::types::Tool;
use anyhow::Result;
use kestrel_bio::formats::fasta::parse_fasta;
use kestrel_bio::sequence::Sequence;
use kestrel_core::config::AlignmentConfig;
use kestrel_core::KestrelError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// MUSCLE 5 integration (`-align in -output out`)
///
/// MUSCLE has no affine gap parameters on its command line, so only the
/// thread count and extra arguments are passed through.
pub struct MuscleAligner {
    binary_path: PathBuf,
    settings: AlignmentConfig,
}

impl MuscleAligner {
    pub fn new(binary_path: PathBuf, settings: AlignmentConfig) -> Self {
        Self {
            binary_path,
            settings,
        }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn arguments(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-align".to_string(),
            input.display().to_string(),
            "-output".to_string(),
            output.display().to_string(),
            "-threads".to_string(),
            effective_threads(self.settings.threads).to_string(),
        ];
        args.extend(self.settings.extra_args.iter().cloned());
        args
    }
}

impl MultipleAligner for MuscleAligner {
    fn align(&self, sequences: &[Sequence]) -> Result<Vec<Sequence>> {
        let scratch = scratch_dir()?;
        let input = write_input(scratch.path(), sequences)?;
        let output_path = scratch.path().join("aligned.fasta");

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(self.arguments(&input, &output_path));
        run_tool(self.name(), &mut cmd)?;

        if !output_path.exists() {
            return Err(
                KestrelError::external_tool(self.name(), "no output file was written").into(),
            );
        }
        let aligned = parse_fasta(&output_path).map_err(|e| {
            KestrelError::external_tool(self.name(), format!("unreadable output: {}", e))
        })?;
        Ok(aligned)
    }

    fn version(&self) -> Result<String> {
        read_version(&self.binary_path, Tool::Muscle.version_flag())
    }

    fn is_available(&self) -> bool {
        self.binary_path.exists()
    }

    fn name(&self) -> &str {
        Tool::Muscle.display_name()
    }
}
