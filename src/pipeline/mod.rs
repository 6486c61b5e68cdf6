//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: crawl a seed URL over HTTP with Ctrl-C handling
//! - `run_with_fetcher`: the same pipeline over any `Fetcher`

pub mod crawl;

pub use crawl::{run_crawler, run_with_fetcher};
