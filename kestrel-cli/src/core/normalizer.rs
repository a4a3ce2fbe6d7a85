//! Metadata normalization
//!
//! Maps the columns of a raw BV-BRC metadata export onto the fixed
//! normalized schema, trims every value and keeps the first row seen for
//! each accession.

use super::report::{StageReport, DUPLICATES, MALFORMED, MISSING_REQUIRED};
use kestrel_bio::formats::fasta::open_for_reading;
use kestrel_bio::formats::table::{clean_header, csv_error, delimiter_for, write_records};
use kestrel_bio::MetadataRecord;
use kestrel_core::config::ColumnMapping;
use kestrel_core::{Config, KestrelError, KestrelResult};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Header positions of the normalized columns
struct ColumnIndex {
    accession: usize,
    collection_date: usize,
    strain: Option<usize>,
    host: Option<usize>,
    location: Option<usize>,
    subtype: Option<usize>,
}

impl ColumnIndex {
    fn locate(headers: &[String], columns: &ColumnMapping, source_name: &str) -> KestrelResult<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name.trim());
        let required = |name: &str| {
            find(name).ok_or_else(|| KestrelError::missing_field(name.trim(), source_name))
        };

        Ok(Self {
            accession: required(&columns.accession)?,
            collection_date: required(&columns.collection_date)?,
            strain: find(&columns.strain),
            host: find(&columns.host),
            location: find(&columns.location),
            subtype: find(&columns.subtype),
        })
    }
}

/// Normalized rows in first-occurrence order plus the stage counts
#[derive(Debug)]
pub struct NormalizeOutcome {
    pub records: Vec<MetadataRecord>,
    pub report: StageReport,
}

/// Normalize a raw delimited table
pub fn normalize_reader<R: Read>(
    reader: R,
    source_name: &str,
    delimiter: u8,
    config: &Config,
) -> KestrelResult<NormalizeOutcome> {
    let source = Path::new(source_name);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(source, e))?
        .iter()
        .map(|h| clean_header(h).to_string())
        .collect();
    let index = ColumnIndex::locate(&headers, &config.metadata.columns, source_name)?;

    let mut report = StageReport::new("normalize");
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
                tracing::warn!("{}: skipping row with invalid UTF-8: {}", source_name, e);
                report.records_in += 1;
                report.drop_one(MALFORMED);
                continue;
            }
            Err(e) => return Err(csv_error(source, e)),
        };
        report.records_in += 1;

        let line = row.position().map(|p| p.line()).unwrap_or(0);
        if row.len() != headers.len() {
            tracing::warn!(
                "{} line {}: expected {} fields, found {}",
                source_name,
                line,
                headers.len(),
                row.len()
            );
            report.drop_one(MALFORMED);
            continue;
        }

        let value = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };
        let record = MetadataRecord {
            accession: value(Some(index.accession)),
            strain: value(index.strain),
            collection_date: value(Some(index.collection_date)),
            host: value(index.host),
            location: value(index.location),
            subtype: value(index.subtype),
        };

        if record.accession.is_empty() || record.collection_date.is_empty() {
            tracing::debug!("{} line {}: missing accession or collection date", source_name, line);
            report.drop_one(MISSING_REQUIRED);
            continue;
        }
        if !seen.insert(record.accession.clone()) {
            tracing::debug!("{} line {}: duplicate accession {}", source_name, line, record.accession);
            report.drop_one(DUPLICATES);
            continue;
        }
        records.push(record);
    }

    report.check_malformed(report.records_in, config.quality.max_malformed_fraction)?;
    report.records_out = records.len();
    Ok(NormalizeOutcome { records, report })
}

/// Normalize `input` into the fixed-schema table at `output`
pub fn normalize_metadata(input: &Path, output: &Path, config: &Config) -> KestrelResult<StageReport> {
    let delimiter = delimiter_for(input, config.metadata.delimiter);
    let reader = open_for_reading(input)?;
    let source_name = input.display().to_string();

    let outcome = normalize_reader(reader, &source_name, delimiter, config)?;
    write_records(output, &outcome.records, config.export.delimiter as u8)?;

    outcome.report.log_summary();
    Ok(outcome.report)
}
