// src/crawler/mod.rs

//! The crawl engine.
//!
//! A [`Crawler`] owns everything one run shares between its workers:
//! - the [`Frontier`] of pending tasks
//! - the [`VisitedRegistry`] that deduplicates scheduling
//! - the [`RateLimiter`] pacing every fetch
//! - the [`ResultAggregator`] collecting records and counters
//!
//! Workers run as futures joined on the caller's task, so they interleave
//! only at fetch, rate-limit and frontier waits. Each shared structure is
//! guarded by its own short lock and no worker ever holds two at once.

mod aggregator;
mod frontier;
mod rate_limit;
mod visited;
mod worker;

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{
    Config, CrawlRecord, CrawlStats, CrawlTask, CrawlerConfig, RecordKind, ResultSet, Termination,
};
use crate::services::{ExclusionPolicy, Fetcher, LinkExtractor};
use crate::storage::RecordSink;
use crate::utils::url::{DomainContext, NormalizedUrl};

pub use aggregator::ResultAggregator;
pub use frontier::Frontier;
pub use rate_limit::RateLimiter;
pub use visited::VisitedRegistry;

use worker::Outcome;

/// Everything a finished (or cancelled) run produced.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub results: ResultSet,
    /// Append-only record log in the order records were produced
    pub records: Vec<CrawlRecord>,
    pub stats: CrawlStats,
}

/// One crawl run over a seed URL.
pub struct Crawler {
    seed: NormalizedUrl,
    config: CrawlerConfig,
    context: DomainContext,
    policy: ExclusionPolicy,
    extractor: LinkExtractor,
    fetcher: Arc<dyn Fetcher>,
    sink: Option<Arc<dyn RecordSink>>,
    limiter: RateLimiter,
    visited: VisitedRegistry,
    frontier: Frontier,
    aggregator: ResultAggregator,
}

impl Crawler {
    /// Validate the configuration and prepare a run for `seed`.
    pub fn new(seed: &str, config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        config.validate()?;

        let seed = NormalizedUrl::parse_with(seed, config.crawler.ignore_query)
            .map_err(|e| AppError::invalid_seed(format!("{seed}: {e}")))?;
        let context = DomainContext::from_seed(&seed);
        let policy = ExclusionPolicy::from_config(&config.filters)?;

        Ok(Self {
            seed,
            context,
            policy,
            extractor: LinkExtractor::new(),
            fetcher,
            sink: None,
            limiter: RateLimiter::from_secs(config.crawler.rate_limit_secs),
            visited: VisitedRegistry::new(),
            frontier: Frontier::new(config.crawler.max_depth),
            aggregator: ResultAggregator::new(),
            config: config.crawler.clone(),
        })
    }

    /// Also hand every record to `sink` as it is produced.
    pub fn with_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Crawl until the frontier drains or `cancel` fires.
    ///
    /// The seed is fetched before the worker pool starts; if that fetch
    /// fails the run ends with [`AppError::SeedFetch`]. A cancelled run still
    /// returns the results gathered so far.
    pub async fn run(self, cancel: &CancellationToken) -> Result<CrawlReport> {
        let started_at = Utc::now();
        log::info!(
            "Crawling {} (max depth {}, {} workers, {:?} between requests)",
            self.seed,
            self.config.max_depth,
            self.config.workers,
            self.limiter.interval()
        );
        log::debug!(
            "Target domain: {} (subdomain '{}')",
            self.context.registered_domain(),
            self.context.subdomain()
        );
        if !self.policy.is_empty() {
            log::debug!("Exclusion filters active");
        }

        self.visited.try_claim(&self.seed);
        self.record(CrawlRecord::discovered(self.seed.clone(), RecordKind::Path, 0));
        self.frontier.push(CrawlTask::new(self.seed.clone(), 0));

        if let Some(task) = self.frontier.pop(cancel).await {
            let outcome = self.process(&task, cancel).await;
            self.frontier.task_done();
            if let Outcome::Failed(source) = outcome {
                return Err(AppError::SeedFetch {
                    url: task.url.to_string(),
                    source,
                });
            }
        }

        join_all((0..self.config.workers).map(|id| self.worker(id, cancel))).await;

        let termination = if cancel.is_cancelled() {
            if !self.frontier.is_empty() {
                log::warn!("Cancelled with {} tasks still queued", self.frontier.len());
            }
            Termination::Cancelled
        } else {
            Termination::Completed
        };
        let finished_at = Utc::now();

        let results = self.aggregator.snapshot();
        let stats = CrawlStats::compute(started_at, finished_at, &results, termination);

        Ok(CrawlReport {
            results,
            records: self.aggregator.into_records(),
            stats,
        })
    }

    /// Forward a record to the sink, then fold it into the results.
    fn record(&self, record: CrawlRecord) -> bool {
        if let Some(sink) = &self.sink {
            sink.append(&record);
        }
        self.aggregator.record(record)
    }
}
