//! Shared result set written by every worker.

use parking_lot::Mutex;

use crate::models::{CrawlRecord, RecordKind, RecordStatus, ResultSet};

#[derive(Debug, Default)]
struct Inner {
    results: ResultSet,
    records: Vec<CrawlRecord>,
}

/// Accumulates crawl records and counters under one lock.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    inner: Mutex<Inner>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and fold it into the result set.
    ///
    /// Returns `true` when a discovery record added a subdomain or path that
    /// was not known yet.
    pub fn record(&self, record: CrawlRecord) -> bool {
        let mut inner = self.inner.lock();
        let results = &mut inner.results;

        let added = match &record.status {
            RecordStatus::Discovered => {
                results.visited.insert(record.url.to_string());
                match record.kind {
                    RecordKind::Subdomain => results.subdomains.insert(record.url.host().to_string()),
                    RecordKind::Path => results.paths.insert(record.url.path_and_query()),
                }
            }
            RecordStatus::Fetched => {
                results.counters.fetched += 1;
                false
            }
            RecordStatus::Failed { .. } => {
                results.counters.failed += 1;
                false
            }
        };

        inner.records.push(record);
        added
    }

    pub fn count_excluded(&self) {
        self.inner.lock().results.counters.excluded += 1;
    }

    pub fn count_malformed(&self) {
        self.inner.lock().results.counters.malformed += 1;
    }

    pub fn count_external(&self) {
        self.inner.lock().results.counters.external += 1;
    }

    /// Copy of the current result set.
    pub fn snapshot(&self) -> ResultSet {
        self.inner.lock().results.clone()
    }

    /// The full record log, in production order.
    pub fn into_records(self) -> Vec<CrawlRecord> {
        self.inner.into_inner().records
    }
}
