//! Frontier work item.

use crate::utils::url::NormalizedUrl;

/// A URL waiting to be fetched, with its link distance from the seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: NormalizedUrl,
    pub depth: usize,
}

impl CrawlTask {
    pub fn new(url: NormalizedUrl, depth: usize) -> Self {
        Self { url, depth }
    }

    /// Task for a link found on this task's page.
    pub fn child(&self, url: NormalizedUrl) -> Self {
        Self {
            url,
            depth: self.depth + 1,
        }
    }
}
