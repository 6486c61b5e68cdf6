//! Append-only crawl records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FailureKind, FetchError};
use crate::utils::url::{Classification, NormalizedUrl};

/// What a recorded URL contributes to the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Lives on another host of the target domain
    Subdomain,
    /// Lives on the seed host
    Path,
}

impl RecordKind {
    /// Kind for an in-scope classification, `None` for everything else.
    pub fn from_classification(class: Classification) -> Option<Self> {
        match class {
            Classification::SameSubdomain => Some(RecordKind::Path),
            Classification::OtherSubdomainOfTarget => Some(RecordKind::Subdomain),
            Classification::ExternalDomain | Classification::Malformed => None,
        }
    }
}

/// Lifecycle stage a record describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordStatus {
    /// Claimed for scheduling
    Discovered,
    /// Fetched with a success status
    Fetched,
    /// Fetch failed
    Failed { failure: FailureKind, message: String },
}

/// One entry of the crawl log. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlRecord {
    pub url: NormalizedUrl,
    pub kind: RecordKind,
    pub depth: usize,
    pub http_status: Option<u16>,
    #[serde(flatten)]
    pub status: RecordStatus,
    pub timestamp: DateTime<Utc>,
}

impl CrawlRecord {
    pub fn discovered(url: NormalizedUrl, kind: RecordKind, depth: usize) -> Self {
        Self {
            url,
            kind,
            depth,
            http_status: None,
            status: RecordStatus::Discovered,
            timestamp: Utc::now(),
        }
    }

    pub fn fetched(url: NormalizedUrl, kind: RecordKind, depth: usize, http_status: u16) -> Self {
        Self {
            url,
            kind,
            depth,
            http_status: Some(http_status),
            status: RecordStatus::Fetched,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(url: NormalizedUrl, kind: RecordKind, depth: usize, error: &FetchError) -> Self {
        Self {
            url,
            kind,
            depth,
            http_status: error.status(),
            status: RecordStatus::Failed {
                failure: error.kind(),
                message: error.to_string(),
            },
            timestamp: Utc::now(),
        }
    }

    pub fn is_discovery(&self) -> bool {
        self.status == RecordStatus::Discovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_classification() {
        assert_eq!(
            RecordKind::from_classification(Classification::SameSubdomain),
            Some(RecordKind::Path)
        );
        assert_eq!(
            RecordKind::from_classification(Classification::OtherSubdomainOfTarget),
            Some(RecordKind::Subdomain)
        );
        assert_eq!(
            RecordKind::from_classification(Classification::ExternalDomain),
            None
        );
    }

    #[test]
    fn test_failed_record_serialization() {
        let url = NormalizedUrl::parse("https://example.com/missing").unwrap();
        let record = CrawlRecord::failed(url, RecordKind::Path, 2, &FetchError::Http { status: 404 });
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["url"], "https://example.com/missing");
        assert_eq!(value["kind"], "path");
        assert_eq!(value["depth"], 2);
        assert_eq!(value["http_status"], 404);
        assert_eq!(value["status"], "failed");
        assert_eq!(value["failure"], "http");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_discovered_record_has_no_status_code() {
        let url = NormalizedUrl::parse("https://sub.example.com/").unwrap();
        let record = CrawlRecord::discovered(url, RecordKind::Subdomain, 1);
        let value = serde_json::to_value(&record).unwrap();

        assert!(record.is_discovery());
        assert!(value["http_status"].is_null());
        assert_eq!(value["status"], "discovered");
    }
}
