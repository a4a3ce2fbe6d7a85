//! Per-stage counts and the run manifest

use kestrel_core::{file_sha256, generate_utc_timestamp, write_atomic, KestrelError, KestrelResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Drop reasons shared by the stages
pub const DUPLICATES: &str = "duplicates";
pub const MISSING_REQUIRED: &str = "missing_required";
pub const MALFORMED: &str = "malformed";
pub const ORPHANS: &str = "orphans";
pub const MISSING_METADATA: &str = "missing_metadata";
pub const MISSING_SEQUENCE: &str = "missing_sequence";
pub const LABEL_COLLISIONS: &str = "label_collisions";

/// What a stage read, kept and dropped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub records_in: usize,
    pub records_out: usize,
    #[serde(default)]
    pub dropped: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl StageReport {
    pub fn new(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            ..Default::default()
        }
    }

    pub fn drop_one(&mut self, reason: &str) {
        *self.dropped.entry(reason.to_string()).or_default() += 1;
    }

    pub fn drop_many(&mut self, reason: &str, count: usize) {
        if count > 0 {
            *self.dropped.entry(reason.to_string()).or_default() += count;
        }
    }

    pub fn dropped_count(&self, reason: &str) -> usize {
        self.dropped.get(reason).copied().unwrap_or(0)
    }

    pub fn total_dropped(&self) -> usize {
        self.dropped.values().sum()
    }

    pub fn note(&mut self, key: &str, value: impl ToString) {
        self.details.insert(key.to_string(), value.to_string());
    }

    /// Fail once the malformed share of `total` records exceeds `limit`
    pub fn check_malformed(&self, total: usize, limit: f64) -> KestrelResult<()> {
        let skipped = self.dropped_count(MALFORMED);
        if total > 0 && skipped as f64 / total as f64 > limit {
            return Err(KestrelError::MalformedThreshold {
                stage: self.stage.clone(),
                skipped,
                total,
                limit,
            });
        }
        Ok(())
    }

    pub fn log_summary(&self) {
        let dropped = self
            .dropped
            .iter()
            .map(|(reason, n)| format!("{}={}", reason, n))
            .collect::<Vec<_>>()
            .join(", ");
        tracing::info!(
            "{}: {} in, {} out{}",
            self.stage,
            self.records_in,
            self.records_out,
            if dropped.is_empty() {
                String::new()
            } else {
                format!(" (dropped: {})", dropped)
            }
        );
    }
}

/// JSON record of one `kestrel run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub tool: String,
    pub version: String,
    pub started_at: String,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub config_path: Option<String>,
    #[serde(default)]
    pub resumed_from: Option<String>,
    pub stages: Vec<StageReport>,
    /// SHA-256 of every input and output, keyed by path
    pub files: BTreeMap<String, String>,
}

impl RunManifest {
    pub fn new(config_path: Option<&Path>) -> Self {
        Self {
            tool: "kestrel".to_string(),
            version: kestrel_core::VERSION.to_string(),
            started_at: generate_utc_timestamp(),
            finished_at: None,
            config_path: config_path.map(|p| p.display().to_string()),
            resumed_from: None,
            stages: Vec::new(),
            files: BTreeMap::new(),
        }
    }

    pub fn record_stage(&mut self, report: StageReport) {
        self.stages.push(report);
    }

    /// Hash a file into the manifest; missing files are skipped
    pub fn record_file(&mut self, path: &Path) -> KestrelResult<()> {
        if path.is_file() {
            let digest = file_sha256(path)?;
            self.files.insert(path.display().to_string(), digest);
        }
        Ok(())
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(generate_utc_timestamp());
    }

    pub fn write(&self, path: &Path) -> KestrelResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, |w| -> KestrelResult<()> {
            w.write_all(json.as_bytes())?;
            w.write_all(b"\n")?;
            Ok(())
        })
    }
}
