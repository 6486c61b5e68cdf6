// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod record;
mod result;
mod task;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, FilterConfig, HeaderPair, MAX_BUFFER_SIZE, MIN_BUFFER_SIZE,
    StorageConfig,
};
pub use record::{CrawlRecord, RecordKind, RecordStatus};
pub use result::{Counters, CrawlStats, ResultSet, Termination};
pub use task::CrawlTask;
