//! Final dataset and tree-builder input

use super::report::{StageReport, LABEL_COLLISIONS, MISSING_SEQUENCE};
use kestrel_bio::formats::fasta::write_fasta_to_writer;
use kestrel_bio::formats::table::write_records_to;
use kestrel_bio::{parse_fasta, read_records, AnnotatedRecord, Sequence};
use kestrel_core::{commit_all, Config, KestrelResult, StagedFile};
use std::collections::HashMap;
use std::path::Path;

const UNSAFE_IN_LABELS: &str = "()[]':;,|=";

fn sanitize_field(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_whitespace() || UNSAFE_IN_LABELS.contains(c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// `accession|strain|subtype|host|location` with Newick-unsafe characters replaced
pub fn tree_label(record: &AnnotatedRecord) -> String {
    [
        &record.accession,
        &record.strain,
        &record.subtype,
        &record.host,
        &record.location,
    ]
    .iter()
    .map(|field| sanitize_field(field))
    .collect::<Vec<_>>()
    .join("|")
}

/// Sort the annotated table by accession and build the tree-input FASTA
///
/// Returns the sorted rows and the relabelled aligned records for rows
/// that have a sequence. Accessions that become identical once sanitized
/// keep only their first record in the tree input.
pub fn prepare_export(
    mut records: Vec<AnnotatedRecord>,
    aligned: Vec<Sequence>,
    report: &mut StageReport,
) -> (Vec<AnnotatedRecord>, Vec<Sequence>) {
    records.sort_by(|a, b| a.accession.cmp(&b.accession));
    records.dedup_by(|later, earlier| later.accession == earlier.accession);

    let mut by_id: HashMap<String, Sequence> = HashMap::with_capacity(aligned.len());
    for seq in aligned {
        by_id.entry(seq.id.clone()).or_insert(seq);
    }

    let mut labelled: HashMap<String, &str> = HashMap::with_capacity(records.len());
    let mut tree_input = Vec::with_capacity(records.len());
    for record in &records {
        match by_id.get(&record.accession) {
            Some(seq) => {
                let key = sanitize_field(&record.accession);
                if let Some(first) = labelled.get(&key) {
                    tracing::warn!(
                        "Accessions {} and {} share the tree label {}; keeping {}",
                        first,
                        record.accession,
                        key,
                        first
                    );
                    report.drop_one(LABEL_COLLISIONS);
                    continue;
                }
                labelled.insert(key, &record.accession);
                tree_input.push(Sequence::new(tree_label(record), seq.sequence.clone()));
            }
            None => {
                tracing::warn!("No aligned sequence for {}", record.accession);
                report.drop_one(MISSING_SEQUENCE);
            }
        }
    }
    (records, tree_input)
}

/// Write the final dataset table and the tree-input FASTA
pub fn export_dataset(
    annotated: &Path,
    aligned: &Path,
    dataset: &Path,
    tree_input: &Path,
    config: &Config,
) -> KestrelResult<StageReport> {
    let delimiter = config.export.delimiter as u8;
    let records: Vec<AnnotatedRecord> = read_records(annotated, delimiter)?;
    let sequences = parse_fasta(aligned)?;

    let mut report = StageReport::new("export");
    report.records_in = records.len();
    let (records, tree_records) = prepare_export(records, sequences, &mut report);

    // Both files are committed together or not at all
    let staged_dataset = StagedFile::new(dataset)?;
    staged_dataset.write(|w| write_records_to(w, dataset, &records, delimiter))?;
    let staged_tree = StagedFile::new(tree_input)?;
    staged_tree.write(|w| write_fasta_to_writer(w, &tree_records, config.export.fasta_line_width))?;
    commit_all(vec![staged_dataset, staged_tree])?;

    report.records_out = records.len();
    report.note("tree_input_records", tree_records.len());
    report.log_summary();
    Ok(report)
}
