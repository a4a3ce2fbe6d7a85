//! External multiple-sequence-alignment tools
//!
//! Kestrel never aligns sequences itself. This crate locates MAFFT or
//! MUSCLE, runs it with the configured parameter set and parses the
//! aligned FASTA it produces.

// Modules
pub mod aligners;
pub mod manager;
pub mod testing;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use aligners::{MafftAligner, MuscleAligner};
pub use manager::{ToolManager, ToolStatus};
pub use testing::MockAligner;
pub use traits::MultipleAligner;
pub use types::Tool;
