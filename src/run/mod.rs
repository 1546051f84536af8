//! Command implementations behind the CLI.
//!
//! Each command opens its own resources, does its work, and returns a value the
//! binary prints. Batch progress and statistics are logged along the way.

mod batch_log;
mod finalize;
mod init;
mod resources;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use futures::StreamExt;
use log::info;
use tokio::io::BufReader;

use crate::app::cancel_on_ctrl_c;
use crate::config::Config;
use crate::export::write_search_results;
use crate::harvest::BatchReport;
use crate::input::read_domains;
use crate::server::{start_server, AppState};
use crate::storage::{BatchSummary, ResolvedRecord, StorageSink};

pub(crate) use batch_log::{record_batch_begin, record_batch_end};
use finalize::finalize_batch;
use init::{init_resources, init_storage};

/// Matches of a keyword search.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Records with at least one matching TXT value
    pub records: Vec<ResolvedRecord>,
    /// CSV file the matches were written to, when an export was requested
    pub export_path: Option<PathBuf>,
}

/// Harvests the domains listed in `input` (`-` reads stdin).
///
/// The batch id is `<input file name>_<unix seconds>` (`stdin_<unix seconds>`
/// for stdin). Ctrl-C cancels the batch; the report then has `cancelled` set.
///
/// # Errors
///
/// Returns an error if the input cannot be read or holds no domain, if
/// initialization fails, or if the batch fails as a whole.
pub async fn run_harvest(config: &Config, input: &Path) -> Result<BatchReport> {
    let (source_name, domains) = read_input(input).await?;
    let resources = init_resources(config).await?;

    let batch_id = format!("{}_{}", source_name, Utc::now().timestamp());
    let (mut progress, handle) = resources
        .harvester
        .start_batch(&batch_id, &domains)
        .context("Failed to start batch")?;
    let total = handle.progress().total;
    record_batch_begin(&resources.sink, &batch_id, &source_name, total).await;

    let ctrl_c = cancel_on_ctrl_c(handle.cancellation_token());
    let mut last_decile = 0;
    while let Some(pct) = progress.next().await {
        if pct / 10 > last_decile {
            last_decile = pct / 10;
            info!("{batch_id}: {pct}% of {total} domains done");
        }
    }
    ctrl_c.abort();

    let stats = handle.stats();
    let result = handle.wait().await;
    record_batch_end(&resources.sink, &batch_id, &result).await;
    finalize_batch(&resources.sink, &stats, result).await
}

/// Searches stored TXT values for `keyword`, optionally exporting the matches
/// to a CSV file in `export_dir`.
///
/// # Errors
///
/// Returns an error if the keyword is blank or storage fails.
pub async fn run_search(
    config: &Config,
    keyword: &str,
    export_dir: Option<&Path>,
) -> Result<SearchReport> {
    let keyword = keyword.trim();
    anyhow::ensure!(!keyword.is_empty(), "Keyword is required");

    let sink = init_storage(config).await?;
    let records = sink
        .find_by_keyword(keyword)
        .await
        .with_context(|| format!("Failed to search for '{keyword}'"))?;
    info!("Found {} records matching '{keyword}'", records.len());

    let export_path = match export_dir {
        Some(dir) if !records.is_empty() => Some(write_search_results(dir, &records)?),
        _ => None,
    };
    sink.pool().close().await;
    Ok(SearchReport {
        records,
        export_path,
    })
}

/// Returns every stored record.
///
/// # Errors
///
/// Returns an error if storage fails.
pub async fn run_list(config: &Config) -> Result<Vec<ResolvedRecord>> {
    let sink = init_storage(config).await?;
    let records = sink.list_all().await.context("Failed to list records")?;
    sink.pool().close().await;
    Ok(records)
}

/// Returns the most recent `limit` batches, newest first.
///
/// # Errors
///
/// Returns an error if storage fails.
pub async fn run_list_batches(config: &Config, limit: u32) -> Result<Vec<BatchSummary>> {
    let sink = init_storage(config).await?;
    let batches = sink
        .recent_batches(limit)
        .await
        .context("Failed to list batches")?;
    sink.pool().close().await;
    Ok(batches)
}

/// Runs the HTTP server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if initialization or binding fails.
pub async fn run_server(config: &Config) -> Result<()> {
    let resources = init_resources(config).await?;
    let state = AppState {
        harvester: resources.harvester,
        batch_log: Some(resources.sink.clone()),
        results_dir: config.results_dir.clone(),
    };
    start_server(&config.bind, state, &config.cors_origin).await?;
    resources.sink.pool().close().await;
    Ok(())
}

async fn read_input(input: &Path) -> Result<(String, Vec<String>)> {
    if input.as_os_str() == "-" {
        info!("Reading domains from stdin");
        let domains = read_domains(BufReader::new(tokio::io::stdin()))
            .await
            .context("Failed to read domains from stdin")?;
        return Ok(("stdin".to_string(), domains));
    }

    let file = tokio::fs::File::open(input)
        .await
        .with_context(|| format!("Failed to open input file {}", input.display()))?;
    let domains = read_domains(BufReader::new(file))
        .await
        .with_context(|| format!("Failed to read domains from {}", input.display()))?;
    let source_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());
    Ok((source_name, domains))
}
