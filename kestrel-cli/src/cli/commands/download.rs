use crate::cli::output::*;
use crate::cli::CommandContext;
use crate::download::{
    read_accessions, read_journal, BvBrcDownloader, DownloadPaths, DownloadProgress,
};
use clap::Args;
use kestrel_core::KestrelError;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// File with one accession per line
    #[arg(value_name = "ACCESSIONS")]
    pub accessions: PathBuf,

    /// Directory for raw_data.jsonl and the download journals
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Maximum requests in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Endpoint with an {accession} placeholder
    #[arg(long, value_name = "URL")]
    pub url_template: Option<String>,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

pub fn run(args: DownloadArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let mut config = ctx.config.clone();
    if let Some(concurrency) = args.concurrency {
        config.download.max_concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout {
        config.download.timeout_seconds = timeout;
    }
    if let Some(template) = args.url_template {
        config.download.url_template = template;
    }
    config.validate()?;

    let accessions = read_accessions(&args.accessions)?;
    if accessions.is_empty() {
        empty(&format!("No accessions in {}", args.accessions.display()));
        return Ok(());
    }

    section_header("BV-BRC download");
    info(&format!(
        "{} accessions, {} concurrent requests",
        format_number(accessions.len()),
        config.download.max_concurrency
    ));

    let downloader = BvBrcDownloader::new(config.download.clone())
        .map_err(|e| KestrelError::Network(format!("{:#}", e)))?;

    let paths = DownloadPaths::new(&args.output_dir);
    let already = read_journal(&paths.downloaded)?;
    let pending = accessions.iter().filter(|a| !already.contains(*a)).count();
    if pending == 0 {
        success("All accessions already downloaded!");
        return Ok(());
    }

    let progress = if args.no_progress {
        DownloadProgress::hidden()
    } else {
        DownloadProgress::new(pending)
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let summary = runtime.block_on(async {
        downloader
            .download_all(&accessions, &args.output_dir, &progress)
            .await
    })?;
    progress.finish_with_message("done");

    tree_item(false, "Downloaded", Some(&format_number(summary.downloaded)));
    tree_item(false, "Failed", Some(&format_number(summary.failed)));
    tree_item(
        true,
        "Total in journal",
        Some(&format_number(summary.total_downloaded)),
    );

    if summary.failed > 0 {
        warning(&format!(
            "{} accessions failed; see {}",
            summary.failed,
            paths.failed.display()
        ));
    }
    success(&format!("Wrote {}", describe_file(&paths.raw_data)));
    Ok(())
}
