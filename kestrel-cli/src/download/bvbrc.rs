//! BV-BRC genome sequence downloader
//!
//! Accessions are fetched concurrently but their results are appended in
//! input order. `downloaded.txt` doubles as the resume journal: anything
//! listed there is skipped on the next run.

use super::progress::DownloadProgress;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use kestrel_core::config::DownloadConfig;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Journal and data files inside a download directory
#[derive(Debug, Clone)]
pub struct DownloadPaths {
    pub raw_data: PathBuf,
    pub downloaded: PathBuf,
    pub failed: PathBuf,
}

impl DownloadPaths {
    pub fn new(dir: &Path) -> Self {
        Self {
            raw_data: dir.join("raw_data.jsonl"),
            downloaded: dir.join("downloaded.txt"),
            failed: dir.join("failed_accessions.txt"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub requested: usize,
    pub already_downloaded: usize,
    pub downloaded: usize,
    pub failed: usize,
    /// Lines in `downloaded.txt` after the run
    pub total_downloaded: usize,
    /// Lines in `failed_accessions.txt` after the run
    pub total_failed: usize,
}

/// Accessions from a list file: one per line, blanks ignored, first
/// occurrence kept
pub fn read_accessions(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read accession list {}", path.display()))?;
    let mut seen = HashSet::new();
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect())
}

/// Accessions already recorded in a `downloaded.txt` journal
pub fn read_journal(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

fn count_lines(path: &Path) -> Result<usize> {
    let text = std::fs::read_to_string(path)?;
    Ok(text.lines().filter(|l| !l.trim().is_empty()).count())
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))
}

pub struct BvBrcDownloader {
    client: Client,
    settings: DownloadConfig,
}

impl BvBrcDownloader {
    pub fn new(settings: DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("Kestrel/{}", kestrel_core::VERSION))
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, settings })
    }

    pub fn url_for(&self, accession: &str) -> String {
        self.settings.url_template.replace("{accession}", accession)
    }

    async fn fetch_once(&self, accession: &str) -> std::result::Result<Value, String> {
        let response = self
            .client
            .get(self.url_for(accession))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read response: {}", e))?;
        Ok(match serde_json::from_str::<Value>(&body) {
            Ok(data) => json!({ "accession": accession, "data": data }),
            Err(_) => json!({ "accession": accession, "raw": body }),
        })
    }

    /// Fetch one accession, retrying once after the configured pause
    pub async fn fetch(&self, accession: &str) -> std::result::Result<Value, String> {
        match self.fetch_once(accession).await {
            Ok(record) => Ok(record),
            Err(reason) => {
                tracing::debug!("{}: {}; retrying", accession, reason);
                tokio::time::sleep(Duration::from_millis(self.settings.retry_delay_ms)).await;
                self.fetch_once(accession).await
            }
        }
    }

    /// Download every accession not yet journalled into `output_dir`
    pub async fn download_all(
        &self,
        accessions: &[String],
        output_dir: &Path,
        progress: &DownloadProgress,
    ) -> Result<DownloadSummary> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        let paths = DownloadPaths::new(output_dir);

        let mut raw = open_append(&paths.raw_data)?;
        let mut journal = open_append(&paths.downloaded)?;
        let mut failures = open_append(&paths.failed)?;

        let done = read_journal(&paths.downloaded)?;
        let pending: Vec<&str> = accessions
            .iter()
            .map(String::as_str)
            .filter(|a| !done.contains(*a))
            .collect();

        let mut summary = DownloadSummary {
            requested: accessions.len(),
            already_downloaded: accessions.len() - pending.len(),
            ..Default::default()
        };
        tracing::info!(
            "{} accessions requested, {} already downloaded",
            summary.requested,
            summary.already_downloaded
        );

        let mut results = stream::iter(pending.iter().map(|&accession| async move {
            (accession, self.fetch(accession).await)
        }))
        .buffered(self.settings.max_concurrency.max(1));

        while let Some((accession, outcome)) = results.next().await {
            match outcome {
                Ok(record) => {
                    writeln!(raw, "{}", serde_json::to_string(&record)?)?;
                    raw.flush()?;
                    writeln!(journal, "{}", accession)?;
                    summary.downloaded += 1;
                }
                Err(reason) => {
                    tracing::warn!("Failed to download {}: {}", accession, reason);
                    writeln!(failures, "{}\t{}", accession, reason.replace(['\n', '\t'], " "))?;
                    summary.failed += 1;
                }
            }
            progress.set_message(accession);
            progress.inc(1);
        }

        journal.flush()?;
        failures.flush()?;
        summary.total_downloaded = count_lines(&paths.downloaded)?;
        summary.total_failed = count_lines(&paths.failed)?;
        Ok(summary)
    }
}
