//! BV-BRC JSONL records as written by the downloader
//!
//! Each line is `{"accession": ..., "data": [ {"sequence": ..., "description": ...}, ... ]}`.
//! Only the first element of `data` is used; a line whose first element has
//! no usable `sequence` is skipped even if a later element has one.

use crate::sequence::Sequence;
use kestrel_core::error::KestrelResult;
use serde_json::Value;
use std::io::BufRead;

/// A line that could not be turned into a sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line_number: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct JsonlExtraction {
    pub sequences: Vec<Sequence>,
    pub skipped: Vec<SkippedLine>,
}

/// Build a sequence from one decoded JSONL object
pub fn extract_record(record: &Value) -> Option<Sequence> {
    let accession = record.get("accession")?.as_str()?.trim();
    if accession.is_empty() {
        return None;
    }

    let first = record.get("data")?.as_array()?.first()?.as_object()?;
    let residues: Vec<u8> = first
        .get("sequence")?
        .as_str()?
        .bytes()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if residues.is_empty() {
        return None;
    }

    let mut seq = Sequence::new(accession.to_string(), residues);
    if let Some(desc) = first.get("description").and_then(Value::as_str) {
        let desc = desc.trim();
        if !desc.is_empty() {
            seq = seq.with_description(desc.to_string());
        }
    }
    Some(seq)
}

/// Read every line of a downloader JSONL file, skipping unusable ones
pub fn extract_sequences<R: BufRead>(reader: R) -> KestrelResult<JsonlExtraction> {
    let mut extraction = JsonlExtraction::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Line {}: JSON decode error - {}", line_number, e);
                extraction.skipped.push(SkippedLine {
                    line_number,
                    reason: format!("JSON decode error: {}", e),
                });
                continue;
            }
        };

        match extract_record(&value) {
            Some(seq) => extraction.sequences.push(seq),
            None => {
                let accession = value
                    .get("accession")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                tracing::warn!(
                    "Line {}: skipped {} - missing accession, sequence, or invalid data structure",
                    line_number,
                    accession
                );
                extraction.skipped.push(SkippedLine {
                    line_number,
                    reason: format!("{}: missing accession or sequence", accession),
                });
            }
        }
    }

    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_extract_record() {
        let record = json!({
            "accession": "CY021709",
            "data": [
                {"sequence": "agc aaa\nagcagg", "description": "Influenza A virus segment 4"},
                {"sequence": "TTTT"}
            ]
        });
        let seq = extract_record(&record).unwrap();
        assert_eq!(seq.id, "CY021709");
        assert_eq!(seq.sequence, b"AGCAAAAGCAGG");
        assert_eq!(seq.description.as_deref(), Some("Influenza A virus segment 4"));
    }

    #[test]
    fn test_extract_record_rejects_incomplete() {
        assert!(extract_record(&json!({"data": [{"sequence": "ACGT"}]})).is_none());
        assert!(extract_record(&json!({"accession": "A", "data": []})).is_none());
        assert!(extract_record(&json!({"accession": "A", "data": [{"sequence": "  "}]})).is_none());
        assert!(extract_record(&json!({"accession": "A", "raw": "<html>"})).is_none());
        assert!(extract_record(&json!({"accession": "A", "data": ["ACGT"]})).is_none());
    }

    #[test]
    fn test_later_data_elements_are_not_consulted() {
        let record = json!({
            "accession": "A",
            "data": [{"sequence": " ", "description": "empty"}, {"sequence": "ACGT"}]
        });
        assert!(extract_record(&record).is_none());
        assert!(extract_record(&json!({"accession": "A", "data": [{}, {"sequence": "ACGT"}]})).is_none());
    }

    #[test]
    fn test_extract_sequences_counts_skips() {
        let input = concat!(
            "{\"accession\":\"A\",\"data\":[{\"sequence\":\"ACGT\"}]}\n",
            "\n",
            "not json\n",
            "{\"accession\":\"B\",\"raw\":\"oops\"}\n",
            "{\"accession\":\"C\",\"data\":[{\"sequence\":\"GG\",\"description\":\"c\"}]}\n",
        );
        let extraction = extract_sequences(Cursor::new(input)).unwrap();

        let ids: Vec<&str> = extraction.sequences.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        let lines: Vec<usize> = extraction.skipped.iter().map(|s| s.line_number).collect();
        assert_eq!(lines, vec![3, 4]);
        assert!(extraction.skipped[1].reason.starts_with("B:"));
    }
}
