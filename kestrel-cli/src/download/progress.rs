use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Accession-count progress bar for the downloader
pub struct DownloadProgress {
    bar: ProgressBar,
}

impl DownloadProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] \
                     {pos}/{len} accessions ({per_sec}, {eta}) {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        // Enable steady tick for smooth spinner animation
        bar.enable_steady_tick(Duration::from_millis(100));

        DownloadProgress { bar }
    }

    /// A bar that never draws, for quiet runs and tests
    pub fn hidden() -> Self {
        DownloadProgress {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn inc(&self, delta: usize) {
        self.bar.inc(delta as u64);
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    pub fn finish_with_message(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Drop for DownloadProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}
