//! Sequential driver for the curation stages
//!
//! Stages only communicate through files in the output directory, so a
//! run can resume at any stage whose inputs are already on disk.

use super::report::RunManifest;
use super::{aligner, classifier, exporter, filter, normalizer};
use anyhow::{Context, Result};
use clap::ValueEnum;
use kestrel_core::{Config, KestrelError};
use kestrel_tools::MultipleAligner;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Stage {
    Normalize,
    Filter,
    Align,
    Classify,
    Export,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Normalize,
        Stage::Filter,
        Stage::Align,
        Stage::Classify,
        Stage::Export,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::Filter => "filter",
            Stage::Align => "align",
            Stage::Classify => "classify",
            Stage::Export => "export",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Files a run reads and writes inside its output directory
#[derive(Debug, Clone)]
pub struct PipelinePaths {
    pub normalized: PathBuf,
    pub filtered: PathBuf,
    pub aligned: PathBuf,
    pub annotated: PathBuf,
    pub dataset: PathBuf,
    pub tree_input: PathBuf,
    pub manifest: PathBuf,
}

impl PipelinePaths {
    pub fn new(dir: &Path) -> Self {
        Self {
            normalized: dir.join("normalized_metadata.tsv"),
            filtered: dir.join("filtered.fasta"),
            aligned: dir.join("aligned.fasta"),
            annotated: dir.join("annotated.tsv"),
            dataset: dir.join("dataset.tsv"),
            tree_input: dir.join("tree_input.fasta"),
            manifest: dir.join("run_manifest.json"),
        }
    }

    /// Earlier outputs a stage reads
    fn prerequisites(&self, stage: Stage) -> Vec<&Path> {
        match stage {
            Stage::Normalize => vec![],
            Stage::Filter => vec![self.normalized.as_path()],
            Stage::Align => vec![self.filtered.as_path()],
            Stage::Classify => vec![self.aligned.as_path(), self.normalized.as_path()],
            Stage::Export => vec![self.annotated.as_path(), self.aligned.as_path()],
        }
    }
}

/// Raw inputs of a run
#[derive(Debug, Clone, Copy)]
pub struct PipelineInputs<'a> {
    pub metadata: &'a Path,
    pub sequences: &'a Path,
    pub lookup: Option<&'a Path>,
}

/// Run every stage from `from` onwards and write the run manifest
///
/// `aligner` is only needed when the alignment stage runs.
pub fn run_pipeline(
    inputs: PipelineInputs<'_>,
    output_dir: &Path,
    from: Stage,
    config: &Config,
    config_path: Option<&Path>,
    aligner: Option<&dyn MultipleAligner>,
) -> Result<RunManifest> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
    let paths = PipelinePaths::new(output_dir);

    for required in paths.prerequisites(from) {
        if !required.is_file() {
            return Err(KestrelError::NotFound(format!(
                "{} is needed to resume at '{}'; run an earlier stage first",
                required.display(),
                from
            ))
            .into());
        }
    }

    let mut manifest = RunManifest::new(config_path);
    if from != Stage::Normalize {
        manifest.resumed_from = Some(from.to_string());
    }

    for stage in Stage::ALL.into_iter().filter(|s| *s >= from) {
        tracing::info!("Running stage {}", stage);
        let report = match stage {
            Stage::Normalize => {
                normalizer::normalize_metadata(inputs.metadata, &paths.normalized, config)
            }
            Stage::Filter => {
                filter::filter_sequences(&paths.normalized, inputs.sequences, &paths.filtered, config)
            }
            Stage::Align => {
                let tool = aligner.ok_or_else(|| {
                    KestrelError::Configuration("no aligner available for the align stage".to_string())
                })?;
                aligner::align_fasta(
                    &paths.filtered,
                    &paths.aligned,
                    tool,
                    config.export.fasta_line_width,
                )
            }
            Stage::Classify => classifier::classify_dataset(
                &paths.aligned,
                &paths.normalized,
                inputs.lookup,
                &paths.annotated,
                config,
            ),
            Stage::Export => exporter::export_dataset(
                &paths.annotated,
                &paths.aligned,
                &paths.dataset,
                &paths.tree_input,
                config,
            ),
        }
        .with_context(|| format!("Stage '{}' failed", stage))?;

        manifest.record_stage(report);
    }

    let mut files = vec![inputs.metadata, inputs.sequences];
    files.extend(inputs.lookup);
    files.extend([
        paths.normalized.as_path(),
        paths.filtered.as_path(),
        paths.aligned.as_path(),
        paths.annotated.as_path(),
        paths.dataset.as_path(),
        paths.tree_input.as_path(),
    ]);
    for file in files {
        manifest.record_file(file)?;
    }

    manifest.finish();
    manifest.write(&paths.manifest)?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_bio::parse_fasta;
    use kestrel_tools::MockAligner;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        metadata: PathBuf,
        sequences: PathBuf,
        output: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let metadata = dir.path().join("metadata.csv");
        let sequences = dir.path().join("sequences.fasta");
        std::fs::write(
            &metadata,
            "accession,strain,collection_date,host,subtype\n\
             B,A/duck/1,2020-01-01,duck,\n\
             A,A/human/2,2021-03-03,human,H3N2\n\
             A,A/human/dup,2021-03-04,human,H1N1\n\
             C,A/swine/3,2019-07-07,swine,\n",
        )
        .unwrap();
        std::fs::write(&sequences, ">A\nACGTAC\n>B\nACGT\n>D\nGGGG\n").unwrap();
        let output = dir.path().join("out");
        Fixture {
            _dir: dir,
            metadata,
            sequences,
            output,
        }
    }

    fn inputs(f: &Fixture) -> PipelineInputs<'_> {
        PipelineInputs {
            metadata: &f.metadata,
            sequences: &f.sequences,
            lookup: None,
        }
    }

    #[test]
    fn test_full_run_writes_every_output() {
        let f = fixture();
        let aligner = MockAligner::new();
        let manifest = run_pipeline(
            inputs(&f),
            &f.output,
            Stage::Normalize,
            &Config::default(),
            None,
            Some(&aligner),
        )
        .unwrap();

        let paths = PipelinePaths::new(&f.output);
        assert_eq!(
            std::fs::read_to_string(&paths.dataset).unwrap(),
            "accession\tstrain\tcollection_date\thost\tlocation\tsubtype\tclassification\tlabel_source\n\
             A\tA/human/2\t2021-03-03\thuman\t\tH3N2\tH3N2\tmetadata\n\
             B\tA/duck/1\t2020-01-01\tduck\t\t\tunassigned\tdefault\n"
        );
        let tree_input = parse_fasta(&paths.tree_input).unwrap();
        assert_eq!(tree_input[0].id, "A|A/human/2|H3N2|human|");
        assert_eq!(tree_input[1].sequence, b"ACGT--");

        let stages: Vec<&str> = manifest.stages.iter().map(|s| s.stage.as_str()).collect();
        assert_eq!(stages, vec!["normalize", "filter", "align", "classify", "export"]);
        assert!(paths.manifest.is_file());
        assert_eq!(manifest.files.len(), 8);
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let f = fixture();
        let aligner = MockAligner::new();
        let config = Config::default();
        let paths = PipelinePaths::new(&f.output);

        run_pipeline(inputs(&f), &f.output, Stage::Normalize, &config, None, Some(&aligner)).unwrap();
        let first = (
            std::fs::read(&paths.dataset).unwrap(),
            std::fs::read(&paths.tree_input).unwrap(),
        );
        run_pipeline(inputs(&f), &f.output, Stage::Normalize, &config, None, Some(&aligner)).unwrap();
        let second = (
            std::fs::read(&paths.dataset).unwrap(),
            std::fs::read(&paths.tree_input).unwrap(),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_align_keeps_earlier_outputs_and_resume_works() {
        let f = fixture();
        let config = Config::default();
        let paths = PipelinePaths::new(&f.output);

        let err = run_pipeline(
            inputs(&f),
            &f.output,
            Stage::Normalize,
            &config,
            None,
            Some(&MockAligner::failing()),
        )
        .unwrap_err();
        assert!(err.chain().any(|e| matches!(
            e.downcast_ref::<KestrelError>(),
            Some(KestrelError::ExternalTool { .. })
        )));
        assert!(paths.filtered.is_file());
        assert!(!paths.aligned.exists());
        assert!(!paths.manifest.exists());

        let manifest = run_pipeline(
            inputs(&f),
            &f.output,
            Stage::Align,
            &config,
            None,
            Some(&MockAligner::new()),
        )
        .unwrap();
        assert_eq!(manifest.resumed_from.as_deref(), Some("align"));
        assert_eq!(manifest.stages.len(), 3);
        assert!(paths.dataset.is_file());
    }

    #[test]
    fn test_resume_without_prerequisites_fails() {
        let f = fixture();
        let err = run_pipeline(
            inputs(&f),
            &f.output,
            Stage::Classify,
            &Config::default(),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KestrelError>(),
            Some(KestrelError::NotFound(_))
        ));
    }
}
