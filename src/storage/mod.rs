//! Storage abstractions for crawl output.
//!
//! Two capabilities are consumed by the rest of the crate:
//! - [`RecordSink`]: non-blocking `append` called by the crawl engine for
//!   every record it produces
//! - [`RecordStore`]: durable batch writes behind the sink
//!
//! [`PersistenceBuffer`] connects the two. [`ResultExporter`] writes the
//! final TXT/JSON result files.
//!
//! ## Output Files
//!
//! ```text
//! {records_file}             # JSON Lines, one CrawlRecord per line
//! {prefix}_subdomains.txt    # text export
//! {prefix}_paths.txt
//! {prefix}_results.json      # JSON export
//! ```

pub mod buffer;
pub mod export;
pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::CrawlRecord;

// Re-export for convenience
pub use buffer::PersistenceBuffer;
pub use export::{ExportFormat, ResultExporter};
pub use local::JsonLinesStore;

/// Receives every record the crawl engine produces.
///
/// `append` is called from inside the engine's critical path and must not
/// block. Durability after it returns is not implied.
pub trait RecordSink: Send + Sync {
    fn append(&self, record: &CrawlRecord);
}

/// Trait for record storage backends.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Durably write one batch. On error nothing may be assumed written.
    async fn write_batch(&self, records: &[CrawlRecord]) -> Result<()>;
}
