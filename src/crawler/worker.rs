//! Per-task processing.

use tokio_util::sync::CancellationToken;

use super::Crawler;
use crate::error::FetchError;
use crate::models::{CrawlRecord, CrawlTask, RecordKind};
use crate::services::FetchedPage;
use crate::utils::url::{Classification, NormalizedUrl};

/// How processing a task ended.
#[derive(Debug)]
pub(super) enum Outcome {
    Fetched,
    Failed(FetchError),
    Cancelled,
}

impl Crawler {
    pub(super) async fn worker(&self, id: usize, cancel: &CancellationToken) {
        let mut processed = 0usize;
        while let Some(task) = self.frontier.pop(cancel).await {
            self.process(&task, cancel).await;
            self.frontier.task_done();
            processed += 1;
        }
        log::debug!("Worker {} stopped after {} tasks", id, processed);
    }

    /// Fetch one task and schedule whatever it links to.
    pub(super) async fn process(&self, task: &CrawlTask, cancel: &CancellationToken) -> Outcome {
        if !self.limiter.acquire(cancel).await {
            return Outcome::Cancelled;
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Cancelled,
            result = self.fetcher.fetch(&task.url) => result,
        };

        let kind = self.kind_of(&task.url);
        match result {
            Ok(page) => {
                log::debug!("[{}] {} (depth {})", page.status, task.url, task.depth);
                self.record(CrawlRecord::fetched(
                    task.url.clone(),
                    kind,
                    task.depth,
                    page.status,
                ));
                self.follow_redirect(task, &page);
                if task.depth < self.config.max_depth {
                    self.expand(task, &page);
                }
                Outcome::Fetched
            }
            Err(e) => {
                log::debug!("Failed to fetch {}: {}", task.url, e);
                self.record(CrawlRecord::failed(task.url.clone(), kind, task.depth, &e));
                Outcome::Failed(e)
            }
        }
    }

    /// Claim the page's links and enqueue the ones this worker won.
    fn expand(&self, task: &CrawlTask, page: &FetchedPage) {
        let candidates = self
            .extractor
            .extract(&page.body, page.content_kind(), &page.final_url);

        for raw in candidates {
            let url = match NormalizedUrl::parse_with(&raw, self.config.ignore_query) {
                Ok(url) => url,
                Err(_) => {
                    self.aggregator.count_malformed();
                    continue;
                }
            };
            if self.admit(&url, task.depth + 1) {
                self.frontier.push(task.child(url));
            }
        }
    }

    /// A redirect target has already been fetched, so it is only claimed.
    fn follow_redirect(&self, task: &CrawlTask, page: &FetchedPage) {
        if page.final_url == *task.url.as_url() {
            return;
        }
        match NormalizedUrl::from_url(page.final_url.clone(), self.config.ignore_query) {
            Ok(target) if target != task.url => {
                self.admit(&target, task.depth);
            }
            _ => {}
        }
    }

    /// Classify, filter and claim a candidate, recording it if claimed.
    ///
    /// Runs without suspending. Returns `true` when this call claimed the URL.
    fn admit(&self, url: &NormalizedUrl, depth: usize) -> bool {
        let class = self.context.classify(url);
        let Some(kind) = RecordKind::from_classification(class) else {
            match class {
                Classification::Malformed => self.aggregator.count_malformed(),
                _ => self.aggregator.count_external(),
            }
            return false;
        };

        if self.policy.is_excluded(url, self.context.subdomain_host(url)) {
            log::debug!("Excluded {}", url);
            self.aggregator.count_excluded();
            return false;
        }

        if !self.visited.try_claim(url) {
            return false;
        }

        let added = self.record(CrawlRecord::discovered(url.clone(), kind, depth));
        if added && kind == RecordKind::Subdomain {
            log::info!("Found subdomain: {}", url.host());
        }
        true
    }

    fn kind_of(&self, url: &NormalizedUrl) -> RecordKind {
        RecordKind::from_classification(self.context.classify(url)).unwrap_or(RecordKind::Path)
    }
}
