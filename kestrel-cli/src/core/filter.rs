//! Sequence filtering against normalized metadata

use super::report::{StageReport, DUPLICATES, MALFORMED, MISSING_SEQUENCE, ORPHANS};
use kestrel_bio::formats::fasta::write_record;
use kestrel_bio::{read_records, FastaReader, MetadataRecord, Sequence};
use kestrel_core::{write_atomic, Alphabet, Config, KestrelError, KestrelResult};
use std::collections::HashSet;
use std::path::Path;

/// Pass through records whose identifier is in `accessions`, in source order
///
/// Orphans (identifiers unknown to the metadata), repeated identifiers and
/// records that fail residue validation or could not be read are counted
/// rather than emitted.
/// The first record seen for an identifier is the one kept, or the one
/// rejected if it is malformed.
pub fn filter_records<I, F>(
    records: I,
    accessions: &HashSet<String>,
    alphabet: Alphabet,
    max_malformed_fraction: f64,
    mut emit: F,
) -> KestrelResult<(StageReport, HashSet<String>)>
where
    I: IntoIterator<Item = KestrelResult<Sequence>>,
    F: FnMut(&Sequence) -> KestrelResult<()>,
{
    let mut report = StageReport::new("filter");
    let mut seen = HashSet::new();
    let mut matched = 0usize;

    for record in records {
        let record = match record {
            Ok(record) => record,
            Err(KestrelError::MalformedRecord(reason)) => {
                tracing::warn!("Skipping unreadable sequence record: {}", reason);
                report.records_in += 1;
                matched += 1;
                report.drop_one(MALFORMED);
                continue;
            }
            Err(e) => return Err(e),
        };
        report.records_in += 1;

        if !accessions.contains(&record.id) {
            tracing::debug!("No metadata for sequence {}", record.id);
            report.drop_one(ORPHANS);
            continue;
        }
        matched += 1;

        if !seen.insert(record.id.clone()) {
            tracing::debug!("Duplicate sequence {} dropped", record.id);
            report.drop_one(DUPLICATES);
            continue;
        }

        if let Err(reason) = record.validate(alphabet) {
            tracing::warn!("Skipping malformed sequence {}: {}", record.id, reason);
            report.drop_one(MALFORMED);
            continue;
        }

        emit(&record)?;
        report.records_out += 1;
    }

    report.check_malformed(matched, max_malformed_fraction)?;

    if report.dropped_count(ORPHANS) > 0 {
        tracing::info!(
            "{} sequences had no metadata row",
            report.dropped_count(ORPHANS)
        );
    }
    Ok((report, seen))
}

/// Write the sequences of `fasta` that have a row in the normalized table
pub fn filter_sequences(
    metadata: &Path,
    fasta: &Path,
    output: &Path,
    config: &Config,
) -> KestrelResult<StageReport> {
    let rows: Vec<MetadataRecord> = read_records(metadata, config.export.delimiter as u8)?;
    let accessions: HashSet<String> = rows.iter().map(|r| r.accession.clone()).collect();
    let width = config.export.fasta_line_width;

    let mut outcome = None;
    write_atomic(output, |w| -> KestrelResult<()> {
        let reader = FastaReader::from_path(fasta)?;
        outcome = Some(filter_records(
            reader,
            &accessions,
            config.quality.alphabet,
            config.quality.max_malformed_fraction,
            |seq| write_record(w, seq, width),
        )?);
        Ok(())
    })?;

    let (mut report, seen) = outcome.unwrap_or_default();
    let unmatched: Vec<&str> = rows
        .iter()
        .map(|r| r.accession.as_str())
        .filter(|a| !seen.contains(*a))
        .collect();
    if !unmatched.is_empty() {
        tracing::info!(
            "{} metadata rows have no sequence (first: {})",
            unmatched.len(),
            unmatched[0]
        );
        report.drop_many(MISSING_SEQUENCE, unmatched.len());
    }

    report.log_summary();
    Ok(report)
}
