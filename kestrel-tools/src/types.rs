//! Common types for tool management

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Multiple-sequence aligners Kestrel can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tool {
    Mafft,
    Muscle,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::Mafft, Tool::Muscle];

    /// Get the name of the tool
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Mafft => "mafft",
            Tool::Muscle => "muscle",
        }
    }

    /// Get the display name of the tool
    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::Mafft => "MAFFT",
            Tool::Muscle => "MUSCLE",
        }
    }

    /// Get the binary name for the tool
    pub fn binary_name(&self) -> &'static str {
        match self {
            Tool::Mafft => "mafft",
            Tool::Muscle => "muscle",
        }
    }

    /// Flag that makes the binary print its version
    pub fn version_flag(&self) -> &'static str {
        match self {
            Tool::Mafft => "--version",
            Tool::Muscle => "-version",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Tool {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mafft" => Ok(Tool::Mafft),
            "muscle" | "muscle5" => Ok(Tool::Muscle),
            _ => anyhow::bail!("Unknown aligner: {} (expected mafft or muscle)", s),
        }
    }
}
