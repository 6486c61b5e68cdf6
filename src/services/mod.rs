//! Service layer for the crawler application.
//!
//! This module contains the per-page collaborators of the crawl engine:
//! - Page fetching (`Fetcher`, `HttpFetcher`)
//! - Link extraction (`LinkExtractor`)
//! - URL exclusion (`ExclusionPolicy`)

mod fetcher;
mod filter;
mod links;

pub use fetcher::{FetchedPage, Fetcher, HttpFetcher};
pub use filter::ExclusionPolicy;
pub use links::{ContentKind, LinkExtractor};
