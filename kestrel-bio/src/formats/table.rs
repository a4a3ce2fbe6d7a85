//! Delimited tables exchanged between stages
//!
//! Every table Kestrel writes has a fixed header in a fixed column order.
//! Readers locate columns by header name, so extra columns are ignored and
//! missing optional ones come back empty.

use kestrel_core::error::{KestrelError, KestrelResult};
use kestrel_core::write_atomic;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Normalized metadata row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub accession: String,
    #[serde(default)]
    pub strain: String,
    pub collection_date: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub subtype: String,
}

/// Normalized row plus its classification label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    pub accession: String,
    #[serde(default)]
    pub strain: String,
    pub collection_date: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub subtype: String,
    pub classification: String,
    pub label_source: String,
}

/// One `accession,label` row of a classification lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub accession: String,
    pub label: String,
}

/// A row type with a fixed header
pub trait TableRow: Serialize + DeserializeOwned {
    /// Header in output order
    const COLUMNS: &'static [&'static str];
    /// Columns that must be present for the table to be read at all
    const REQUIRED: &'static [&'static str];
}

impl TableRow for MetadataRecord {
    const COLUMNS: &'static [&'static str] = &[
        "accession",
        "strain",
        "collection_date",
        "host",
        "location",
        "subtype",
    ];
    const REQUIRED: &'static [&'static str] = &["accession", "collection_date"];
}

impl TableRow for AnnotatedRecord {
    const COLUMNS: &'static [&'static str] = &[
        "accession",
        "strain",
        "collection_date",
        "host",
        "location",
        "subtype",
        "classification",
        "label_source",
    ];
    const REQUIRED: &'static [&'static str] =
        &["accession", "collection_date", "classification", "label_source"];
}

impl TableRow for LookupEntry {
    const COLUMNS: &'static [&'static str] = &["accession", "label"];
    const REQUIRED: &'static [&'static str] = &["accession", "label"];
}

impl MetadataRecord {
    /// Value of a normalized column by name
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "accession" => Some(&self.accession),
            "strain" => Some(&self.strain),
            "collection_date" => Some(&self.collection_date),
            "host" => Some(&self.host),
            "location" => Some(&self.location),
            "subtype" => Some(&self.subtype),
            _ => None,
        }
    }
}

impl AnnotatedRecord {
    pub fn from_metadata(record: MetadataRecord, classification: String, label_source: String) -> Self {
        Self {
            accession: record.accession,
            strain: record.strain,
            collection_date: record.collection_date,
            host: record.host,
            location: record.location,
            subtype: record.subtype,
            classification,
            label_source,
        }
    }
}

/// Input delimiter: the configured one, else tab for `.tsv`/`.tab`, else comma
pub fn delimiter_for(path: &Path, configured: Option<char>) -> u8 {
    if let Some(c) = configured {
        return c as u8;
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);

    if name.ends_with(".tsv") || name.ends_with(".tab") {
        b'\t'
    } else {
        b','
    }
}

/// Header cell with surrounding whitespace and a UTF-8 BOM removed
pub fn clean_header(cell: &str) -> &str {
    cell.trim_start_matches('\u{feff}').trim()
}

/// Convert a csv error, keeping I/O failures as I/O
pub fn csv_error(path: &Path, err: csv::Error) -> KestrelError {
    let line = err
        .position()
        .map(|p| format!(" line {}", p.line()))
        .unwrap_or_default();
    let message = format!("{}{}: {}", path.display(), line, err);

    match err.into_kind() {
        csv::ErrorKind::Io(io) => KestrelError::Io(io),
        _ => KestrelError::Parse(message),
    }
}

/// Read a table written by Kestrel (or shaped like one)
///
/// Fails with `MissingRequiredField` when a required column is absent.
pub fn read_records<T: TableRow, P: AsRef<Path>>(path: P, delimiter: u8) -> KestrelResult<Vec<T>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(|h| clean_header(h).to_string())
        .collect();

    for required in T::REQUIRED {
        if !headers.iter().any(|h| h == required) {
            return Err(KestrelError::missing_field(*required, path.display().to_string()));
        }
    }
    reader.set_headers(csv::StringRecord::from(headers));

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row.map_err(|e| csv_error(path, e))?);
    }
    Ok(records)
}

/// Write a table with its fixed header to any writer
///
/// `path` only names the destination in error messages.
pub fn write_records_to<T: TableRow, W: Write>(
    writer: W,
    path: &Path,
    records: &[T],
    delimiter: u8,
) -> KestrelResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(writer);

    writer
        .write_record(T::COLUMNS)
        .map_err(|e| csv_error(path, e))?;
    for record in records {
        writer.serialize(record).map_err(|e| csv_error(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

/// Atomically write a table with its fixed header
pub fn write_records<T: TableRow, P: AsRef<Path>>(
    path: P,
    records: &[T],
    delimiter: u8,
) -> KestrelResult<()> {
    let path = path.as_ref();
    write_atomic(path, |w| write_records_to(w, path, records, delimiter))
}
