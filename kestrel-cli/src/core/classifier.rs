//! Classification labels for aligned records
//!
//! A record's label is resolved from, in order: the subtype already in its
//! metadata, an optional accession lookup table, the configured rules (by
//! ascending priority, then declaration order) and finally the default
//! label. The first source that yields a label wins.

use super::report::{StageReport, MISSING_METADATA, MISSING_SEQUENCE};
use kestrel_bio::formats::table::delimiter_for;
use kestrel_bio::{parse_fasta, read_records, write_records, AnnotatedRecord, LookupEntry, MetadataRecord, Sequence};
use kestrel_core::config::{ClassificationConfig, RuleMatcher};
use kestrel_core::{Config, KestrelError, KestrelResult};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

pub const SOURCE_METADATA: &str = "metadata";
pub const SOURCE_LOOKUP: &str = "lookup";
pub const SOURCE_DEFAULT: &str = "default";

enum Matcher {
    Metadata { field: String, pattern: Regex },
    Position { column: usize, residues: Vec<u8> },
}

struct Rule {
    name: String,
    label: String,
    matcher: Matcher,
}

impl Rule {
    fn matches(&self, record: &MetadataRecord, sequence: &Sequence) -> bool {
        match &self.matcher {
            Matcher::Metadata { field, pattern } => {
                record.field(field).is_some_and(|value| pattern.is_match(value))
            }
            Matcher::Position { column, residues } => sequence
                .residue_at(*column)
                .is_some_and(|r| residues.contains(&r.to_ascii_uppercase())),
        }
    }
}

/// A resolved label and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub label: String,
    pub source: String,
}

pub struct Classifier {
    rules: Vec<Rule>,
    lookup: HashMap<String, String>,
    default_label: String,
}

impl Classifier {
    /// Compile the configured rules
    pub fn new(config: &ClassificationConfig) -> KestrelResult<Self> {
        let mut ordered: Vec<_> = config.rules.iter().collect();
        // Stable, so equal priorities keep declaration order
        ordered.sort_by_key(|rule| rule.priority);

        let mut rules = Vec::with_capacity(ordered.len());
        for rule in ordered {
            let matcher = match &rule.matcher {
                RuleMatcher::Metadata { field, pattern } => {
                    if MetadataRecord::default().field(field).is_none() {
                        return Err(KestrelError::Configuration(format!(
                            "classification rule '{}': unknown metadata field '{}'",
                            rule.name, field
                        )));
                    }
                    let pattern = Regex::new(pattern).map_err(|e| {
                        KestrelError::Configuration(format!(
                            "classification rule '{}': invalid pattern: {}",
                            rule.name, e
                        ))
                    })?;
                    Matcher::Metadata {
                        field: field.clone(),
                        pattern,
                    }
                }
                RuleMatcher::Position { column, residues } => Matcher::Position {
                    column: *column,
                    residues: residues.to_ascii_uppercase().into_bytes(),
                },
            };
            rules.push(Rule {
                name: rule.name.clone(),
                label: rule.label.clone(),
                matcher,
            });
        }

        Ok(Self {
            rules,
            lookup: HashMap::new(),
            default_label: config.default_label.clone(),
        })
    }

    /// Add lookup entries; the first label given for an accession wins
    pub fn with_lookup(mut self, entries: Vec<LookupEntry>) -> Self {
        let mut repeated = 0usize;
        for entry in entries {
            if entry.accession.is_empty() || entry.label.is_empty() {
                continue;
            }
            if self.lookup.contains_key(&entry.accession) {
                repeated += 1;
                continue;
            }
            self.lookup.insert(entry.accession, entry.label);
        }
        if repeated > 0 {
            tracing::info!("Ignored {} repeated lookup accessions", repeated);
        }
        self
    }

    pub fn classify(&self, record: &MetadataRecord, sequence: &Sequence) -> Label {
        if !record.subtype.is_empty() {
            return Label {
                label: record.subtype.clone(),
                source: SOURCE_METADATA.to_string(),
            };
        }
        if let Some(label) = self.lookup.get(&record.accession) {
            return Label {
                label: label.clone(),
                source: SOURCE_LOOKUP.to_string(),
            };
        }
        if let Some(rule) = self.rules.iter().find(|r| r.matches(record, sequence)) {
            return Label {
                label: rule.label.clone(),
                source: format!("rule:{}", rule.name),
            };
        }
        Label {
            label: self.default_label.clone(),
            source: SOURCE_DEFAULT.to_string(),
        }
    }

    /// Join aligned records with their metadata and label each one
    ///
    /// Output follows alignment order. Identifiers present on only one
    /// side are counted and dropped.
    pub fn annotate(
        &self,
        aligned: &[Sequence],
        metadata: Vec<MetadataRecord>,
    ) -> (Vec<AnnotatedRecord>, StageReport) {
        let mut report = StageReport::new("classify");
        report.records_in = aligned.len();

        let mut by_accession: HashMap<String, MetadataRecord> = HashMap::new();
        for record in metadata {
            by_accession.entry(record.accession.clone()).or_insert(record);
        }

        let mut sources: BTreeMap<String, usize> = BTreeMap::new();
        let mut annotated = Vec::with_capacity(aligned.len());
        for seq in aligned {
            let Some(record) = by_accession.remove(&seq.id) else {
                tracing::debug!("Aligned sequence {} has no metadata", seq.id);
                report.drop_one(MISSING_METADATA);
                continue;
            };
            let label = self.classify(&record, seq);
            let kind = label.source.split(':').next().unwrap_or("").to_string();
            *sources.entry(kind).or_default() += 1;
            annotated.push(AnnotatedRecord::from_metadata(record, label.label, label.source));
        }

        if !by_accession.is_empty() {
            tracing::info!("{} metadata rows have no aligned sequence", by_accession.len());
            report.drop_many(MISSING_SEQUENCE, by_accession.len());
        }
        if report.dropped_count(MISSING_METADATA) > 0 {
            tracing::info!(
                "{} aligned sequences have no metadata row",
                report.dropped_count(MISSING_METADATA)
            );
        }
        for (kind, count) in sources {
            report.note(&format!("labels.{}", kind), count);
        }

        report.records_out = annotated.len();
        (annotated, report)
    }
}

/// Read a two-column `accession,label` lookup table
pub fn load_lookup(path: &Path) -> KestrelResult<Vec<LookupEntry>> {
    read_records(path, delimiter_for(path, None))
}

/// Classify the aligned FASTA against the normalized table
pub fn classify_dataset(
    aligned: &Path,
    metadata: &Path,
    lookup: Option<&Path>,
    output: &Path,
    config: &Config,
) -> KestrelResult<StageReport> {
    let delimiter = config.export.delimiter as u8;
    let mut classifier = Classifier::new(&config.classification)?;
    if let Some(lookup) = lookup {
        classifier = classifier.with_lookup(load_lookup(lookup)?);
    }

    let sequences = parse_fasta(aligned)?;
    let rows: Vec<MetadataRecord> = read_records(metadata, delimiter)?;
    let (annotated, report) = classifier.annotate(&sequences, rows);

    write_records(output, &annotated, delimiter)?;
    report.log_summary();
    Ok(report)
}
