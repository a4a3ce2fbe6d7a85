//! Curation stages of the Kestrel CLI

// Pipeline stages
pub mod aligner;
pub mod classifier;
pub mod exporter;
pub mod filter;
pub mod normalizer;
pub mod pipeline;

// Auxiliary conversions
pub mod extractor;
pub mod tree;

pub mod report;

pub use pipeline::{run_pipeline, PipelineInputs, PipelinePaths, Stage};
pub use report::StageReport;
