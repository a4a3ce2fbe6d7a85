//! MAFFT aligner implementation

use super::{effective_threads, read_version, run_tool, scratch_dir, write_input};
use crate::traits::MultipleAligner;
use crate::types::Tool;
use anyhow::Result;
use kestrel_bio::formats::fasta::parse_fasta_from_bytes;
use kestrel_bio::sequence::Sequence;
use kestrel_core::config::AlignmentConfig;
use kestrel_core::KestrelError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// MAFFT integration; the alignment is read from the tool's stdout
pub struct MafftAligner {
    binary_path: PathBuf,
    settings: AlignmentConfig,
}

impl MafftAligner {
    pub fn new(binary_path: PathBuf, settings: AlignmentConfig) -> Self {
        Self {
            binary_path,
            settings,
        }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Arguments before the input path
    fn arguments(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.settings.strategy.trim().is_empty() {
            args.push(self.settings.strategy.trim().to_string());
        }
        args.push("--op".to_string());
        args.push(self.settings.gap_open.to_string());
        args.push("--ep".to_string());
        args.push(self.settings.gap_extension.to_string());
        args.push("--thread".to_string());
        args.push(effective_threads(self.settings.threads).to_string());
        args.extend(self.settings.extra_args.iter().cloned());
        args
    }
}

impl MultipleAligner for MafftAligner {
    fn align(&self, sequences: &[Sequence]) -> Result<Vec<Sequence>> {
        let scratch = scratch_dir()?;
        let input = write_input(scratch.path(), sequences)?;

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(self.arguments()).arg(&input);

        let output = run_tool(self.name(), &mut cmd)?;
        let aligned = parse_fasta_from_bytes(&output.stdout).map_err(|e| {
            KestrelError::external_tool(self.name(), format!("unreadable output: {}", e))
        })?;
        Ok(aligned)
    }

    fn version(&self) -> Result<String> {
        read_version(&self.binary_path, Tool::Mafft.version_flag())
    }

    fn is_available(&self) -> bool {
        self.binary_path.exists()
    }

    fn name(&self) -> &str {
        Tool::Mafft.display_name()
    }
}
