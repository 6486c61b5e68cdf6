//! Registry of URLs already claimed for scheduling.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::utils::url::NormalizedUrl;

/// Set of URLs already claimed.
#[derive(Debug, Default)]
pub struct VisitedRegistry {
    seen: Mutex<HashSet<NormalizedUrl>>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-insert in one critical section. Exactly one caller wins per URL.
    pub fn try_claim(&self, url: &NormalizedUrl) -> bool {
        self.seen.lock().insert(url.clone())
    }

    #[cfg(test)]
    pub fn contains(&self, url: &NormalizedUrl) -> bool {
        self.seen.lock().contains(url)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}
