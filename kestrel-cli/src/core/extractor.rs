//! Downloader JSONL to FASTA

use super::report::{StageReport, MALFORMED};
use kestrel_bio::formats::fasta::open_for_reading;
use kestrel_bio::{extract_sequences, write_fasta};
use kestrel_core::{Config, KestrelResult};
use std::path::Path;

/// Convert `raw_data.jsonl` into a FASTA file; unusable lines are skipped
pub fn extract_fasta(input: &Path, output: &Path, config: &Config) -> KestrelResult<StageReport> {
    let extraction = extract_sequences(open_for_reading(input)?)?;
    write_fasta(output, &extraction.sequences, config.export.fasta_line_width)?;

    let mut report = StageReport::new("extract");
    report.records_in = extraction.sequences.len() + extraction.skipped.len();
    report.records_out = extraction.sequences.len();
    report.drop_many(MALFORMED, extraction.skipped.len());
    report.log_summary();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_fasta() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw_data.jsonl");
        let output = dir.path().join("raw.fasta");
        std::fs::write(
            &input,
            "{\"accession\":\"CY1\",\"data\":[{\"sequence\":\"acgt\",\"description\":\"segment 4\"}]}\n\
             {\"accession\":\"CY2\",\"raw\":\"<html>\"}\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.export.fasta_line_width = 2;
        let report = extract_fasta(&input, &output, &config).unwrap();

        assert_eq!(report.records_out, 1);
        assert_eq!(report.dropped_count(MALFORMED), 1);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            ">CY1 segment 4\nAC\nGT\n"
        );
    }
}
