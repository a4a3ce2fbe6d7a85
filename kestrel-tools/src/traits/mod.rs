pub mod aligner;

pub use aligner::MultipleAligner;
