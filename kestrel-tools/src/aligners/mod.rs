//! Process plumbing shared by the aligner wrappers

mod mafft;
mod muscle;

pub use mafft::MafftAligner;
pub use muscle::MuscleAligner;

use anyhow::{Context, Result};
use kestrel_bio::formats::fasta::write_fasta_to_writer;
use kestrel_bio::sequence::Sequence;
use kestrel_core::KestrelError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Lines of stderr quoted in a failure message
const STDERR_TAIL_LINES: usize = 10;

/// Thread count handed to an aligner (0 = every core)
pub(crate) fn effective_threads(configured: usize) -> usize {
    if configured == 0 {
        num_cpus::get()
    } else {
        configured
    }
}

/// Write the unaligned input into the tool's scratch directory
pub(crate) fn write_input(dir: &Path, sequences: &[Sequence]) -> Result<PathBuf> {
    let path = dir.join("input.fasta");
    let mut writer = BufWriter::new(File::create(&path)?);
    write_fasta_to_writer(&mut writer, sequences, 0)?;
    writer.flush()?;
    Ok(path)
}

/// Run an aligner to completion, turning launch failures and non-zero exits
/// into `ExternalTool` errors
pub(crate) fn run_tool(tool: &str, cmd: &mut Command) -> Result<Output> {
    tracing::info!("Running {:?}", cmd);

    let output = cmd
        .output()
        .map_err(|e| KestrelError::external_tool(tool, format!("could not start: {}", e)))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        tracing::debug!(target: "kestrel_tools::stderr", "{}: {}", tool, line);
    }

    if !output.status.success() {
        let tail: Vec<&str> = stderr
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();
        let tail = tail[tail.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
        let status = match output.status.code() {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        let message = if tail.is_empty() {
            status
        } else {
            format!("{}\n{}", status, tail)
        };
        return Err(KestrelError::external_tool(tool, message).into());
    }

    Ok(output)
}

/// First non-empty line the binary prints for its version flag
pub(crate) fn read_version(binary: &Path, flag: &str) -> Result<String> {
    let output = Command::new(binary)
        .arg(flag)
        .output()
        .with_context(|| format!("Failed to run {} {}", binary.display(), flag))?;

    // MAFFT prints its version on stderr, MUSCLE on stdout
    let text = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("{} printed no version", binary.display()))
}

pub(crate) fn scratch_dir() -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("kestrel-align-")
        .tempdir()
        .context("Failed to create alignment scratch directory")
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Write an executable shell script standing in for an aligner
    pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_tool_failure_is_external_tool_error() {
        let dir = TempDir::new().unwrap();
        let script = test_support::fake_tool(dir.path(), "broken", "echo 'bad residue' >&2\nexit 3");

        let err = run_tool("MAFFT", &mut Command::new(&script)).unwrap_err();
        match err.downcast_ref::<KestrelError>() {
            Some(KestrelError::ExternalTool { tool, message }) => {
                assert_eq!(tool, "MAFFT");
                assert!(message.starts_with("exit status 3"));
                assert!(message.contains("bad residue"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_run_tool_missing_binary() {
        let err = run_tool("MUSCLE", &mut Command::new("/nonexistent/muscle")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KestrelError>(),
            Some(KestrelError::ExternalTool { .. })
        ));
    }

    #[test]
    fn test_read_version_from_stderr() {
        let dir = TempDir::new().unwrap();
        let script = test_support::fake_tool(dir.path(), "mafft", "echo 'v7.505 (2022/Apr/10)' >&2");
        assert_eq!(
            read_version(&script, "--version").unwrap(),
            "v7.505 (2022/Apr/10)"
        );
    }

    #[test]
    fn test_effective_threads() {
        assert_eq!(effective_threads(4), 4);
        assert!(effective_threads(0) >= 1);
    }
}
