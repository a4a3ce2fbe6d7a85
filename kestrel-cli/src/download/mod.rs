pub mod bvbrc;
pub mod progress;

pub use bvbrc::{read_accessions, read_journal, BvBrcDownloader, DownloadPaths};
pub use progress::DownloadProgress;
