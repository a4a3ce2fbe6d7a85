/// Traits for multiple-sequence alignment tools
use anyhow::Result;
use kestrel_bio::sequence::Sequence;

/// A tool that turns unaligned sequences into an alignment
///
/// Implementations return the records exactly as the tool emitted them;
/// checking that the result is a usable alignment is the caller's job.
pub trait MultipleAligner: Send + Sync {
    /// Align `sequences`, returning the tool's records in its output order
    fn align(&self, sequences: &[Sequence]) -> Result<Vec<Sequence>>;

    /// Get tool version
    fn version(&self) -> Result<String>;

    /// Check if tool is available
    fn is_available(&self) -> bool;

    /// Name used in logs and error messages
    fn name(&self) -> &str;
}
