//! Locating aligner binaries
//!
//! A binary is taken from, in order: the path configured in
//! `[alignment] binary`, the Kestrel tools directory
//! (`$KESTREL_HOME/tools`), then `PATH`.

use crate::aligners::{MafftAligner, MuscleAligner};
use crate::traits::MultipleAligner;
use crate::types::Tool;
use anyhow::Result;
use kestrel_core::config::AlignmentConfig;
use kestrel_core::KestrelError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where a tool was found and what it reports about itself
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub tool: Tool,
    pub binary_path: Option<PathBuf>,
    pub version: Option<String>,
}

/// Manager for external alignment tools
pub struct ToolManager {
    tools_dir: PathBuf,
}

impl ToolManager {
    /// Create a new tool manager with the default tools directory
    pub fn new() -> Self {
        Self {
            tools_dir: kestrel_core::kestrel_tools_dir(),
        }
    }

    /// Create a tool manager with a custom directory
    pub fn with_directory<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            tools_dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn tools_dir(&self) -> &Path {
        &self.tools_dir
    }

    /// Binary installed under the tools directory, either flat or in a
    /// per-tool subdirectory
    pub fn installed_path(&self, tool: Tool) -> Option<PathBuf> {
        [
            self.tools_dir.join(tool.name()).join(tool.binary_name()),
            self.tools_dir.join(tool.name()).join("bin").join(tool.binary_name()),
            self.tools_dir.join(tool.binary_name()),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }

    /// Resolve the binary for `tool`
    pub fn resolve(&self, tool: Tool, configured: Option<&str>) -> Result<PathBuf> {
        if let Some(configured) = configured.filter(|c| !c.trim().is_empty()) {
            let path = PathBuf::from(configured);
            if path.is_file() {
                return Ok(path);
            }
            // A bare command name is looked up on PATH
            if path.components().count() == 1 {
                if let Ok(found) = which::which(configured) {
                    return Ok(found);
                }
            }
            return Err(KestrelError::Configuration(format!(
                "configured {} binary not found: {}",
                tool.display_name(),
                configured
            ))
            .into());
        }

        if let Some(path) = self.installed_path(tool) {
            tracing::debug!("Using {} from tools directory: {}", tool, path.display());
            return Ok(path);
        }

        which::which(tool.binary_name()).map_err(|_| {
            KestrelError::NotFound(format!(
                "{} not found in {} or on PATH; install it or set [alignment] binary",
                tool.display_name(),
                self.tools_dir.display()
            ))
            .into()
        })
    }

    /// Build the aligner described by the `[alignment]` section
    pub fn aligner_for(&self, settings: &AlignmentConfig) -> Result<Box<dyn MultipleAligner>> {
        let tool: Tool = settings
            .tool
            .parse()
            .map_err(|e: anyhow::Error| KestrelError::Configuration(e.to_string()))?;
        let binary = self.resolve(tool, settings.binary.as_deref())?;

        Ok(match tool {
            Tool::Mafft => Box::new(MafftAligner::new(binary, settings.clone())),
            Tool::Muscle => Box::new(MuscleAligner::new(binary, settings.clone())),
        })
    }

    /// Status of every supported tool; the configured one uses the configured binary
    pub fn list_all_tools(&self, settings: &AlignmentConfig) -> Vec<ToolStatus> {
        let configured_tool = settings.tool.parse::<Tool>().ok();

        Tool::ALL
            .iter()
            .map(|&tool| {
                let configured = if Some(tool) == configured_tool {
                    settings.binary.as_deref()
                } else {
                    None
                };
                let binary_path = self.resolve(tool, configured).ok();
                let version = binary_path.as_ref().and_then(|path| {
                    crate::aligners::read_version(path, tool.version_flag()).ok()
                });
                ToolStatus {
                    tool,
                    binary_path,
                    version,
                }
            })
            .collect()
    }
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}
