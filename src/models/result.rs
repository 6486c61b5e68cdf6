//! Crawl results and execution metrics.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregate of everything discovered by a crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    /// Hosts of the target domain other than the seed host
    pub subdomains: BTreeSet<String>,
    /// Paths (with query) on the seed host
    pub paths: BTreeSet<String>,
    /// Every URL claimed for scheduling
    pub visited: BTreeSet<String>,
    pub counters: Counters,
}

/// Per-run event counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub fetched: u64,
    pub failed: u64,
    pub excluded: u64,
    pub malformed: u64,
    pub external: u64,
}

/// How the crawl ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Completed,
    Cancelled,
}

/// Timing and throughput of a finished crawl.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub urls_per_second: f64,
    pub avg_secs_per_url: f64,
    pub discovery_rate: f64,
    pub termination: Termination,
}

impl CrawlStats {
    pub fn compute(
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        results: &ResultSet,
        termination: Termination,
    ) -> Self {
        let elapsed_secs = (finished_at - started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let visited = results.visited.len() as f64;
        let discovered = (results.subdomains.len() + results.paths.len()) as f64;

        let per_second = |count: f64| {
            if elapsed_secs > 0.0 {
                count / elapsed_secs
            } else {
                0.0
            }
        };

        Self {
            started_at,
            finished_at,
            elapsed_secs,
            urls_per_second: per_second(visited),
            avg_secs_per_url: if visited > 0.0 {
                elapsed_secs / visited
            } else {
                0.0
            },
            discovery_rate: per_second(discovered),
            termination,
        }
    }
}
