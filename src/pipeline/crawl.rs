// src/pipeline/crawl.rs

//! Crawl pipeline: fetcher, record persistence, engine and export.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::crawler::{CrawlReport, Crawler};
use crate::error::Result;
use crate::models::{Config, Termination};
use crate::services::{Fetcher, HttpFetcher};
use crate::storage::{JsonLinesStore, PersistenceBuffer, ResultExporter};

/// Crawl `seed` over HTTP until done or interrupted with Ctrl-C.
pub async fn run_crawler(
    config: &Config,
    seed: &str,
    exporter: Option<&ResultExporter>,
) -> Result<CrawlReport> {
    config.validate()?;
    let fetcher = Arc::new(HttpFetcher::new(&config.crawler)?);
    let cancel = CancellationToken::new();
    let interrupt = cancel_on_interrupt(cancel.clone());

    let outcome = run_with_fetcher(config, seed, fetcher, exporter, &cancel).await;

    interrupt.abort();
    outcome
}

/// Run the pipeline with any fetcher and an externally owned cancel token.
///
/// The persistence buffer is closed (final flush) whether the crawl
/// completes, is cancelled or fails on the seed.
pub async fn run_with_fetcher(
    config: &Config,
    seed: &str,
    fetcher: Arc<dyn Fetcher>,
    exporter: Option<&ResultExporter>,
    cancel: &CancellationToken,
) -> Result<CrawlReport> {
    let mut crawler = Crawler::new(seed, config, fetcher)?;

    let buffer = match &config.storage.records_file {
        Some(path) => {
            let store = Arc::new(JsonLinesStore::new(path));
            let buffer = Arc::new(PersistenceBuffer::start(store, config.storage.buffer_size));
            log::info!(
                "Recording crawl log to {} (batches of {})",
                path.display(),
                config.storage.buffer_size
            );
            crawler = crawler.with_sink(buffer.clone());
            Some(buffer)
        }
        None => None,
    };

    let outcome = crawler.run(cancel).await;

    if let Some(buffer) = &buffer {
        match buffer.close().await {
            Ok(_) => log::info!("Persisted {} records", buffer.written()),
            Err(e) => log::warn!(
                "Final record flush failed, {} records not persisted: {}",
                buffer.pending(),
                e
            ),
        }
    }

    let report = outcome?;
    log_summary(&report);

    if let Some(exporter) = exporter {
        for path in exporter.export(&report.results, &report.stats).await? {
            log::info!("Saved {}", path.display());
        }
    }

    Ok(report)
}

fn cancel_on_interrupt(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::warn!("Interrupted, stopping workers and keeping partial results");
                cancel.cancel();
            }
            Err(e) => log::warn!("Cannot listen for Ctrl-C: {}", e),
        }
    })
}

fn log_summary(report: &CrawlReport) {
    let results = &report.results;
    let stats = &report.stats;
    let counters = &results.counters;

    let status = match stats.termination {
        Termination::Completed => "completed",
        Termination::Cancelled => "cancelled",
    };

    log::info!(
        "Crawl {} in {:.2}s: {} subdomains, {} paths, {} URLs visited",
        status,
        stats.elapsed_secs,
        results.subdomains.len(),
        results.paths.len(),
        results.visited.len()
    );
    log::info!(
        "Fetched {}, failed {}, excluded {}, malformed {}, external {}",
        counters.fetched,
        counters.failed,
        counters.excluded,
        counters.malformed,
        counters.external
    );
    log::info!(
        "{:.2} URLs/s, {:.3}s per URL, {:.2} discoveries/s",
        stats.urls_per_second,
        stats.avg_secs_per_url,
        stats.discovery_rate
    );
}
