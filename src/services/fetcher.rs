// src/services/fetcher.rs

//! Page fetching.
//!
//! The crawl engine only sees the [`Fetcher`] trait; [`HttpFetcher`] is the
//! reqwest-backed implementation used by the CLI.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::{FetchError, Result};
use crate::models::CrawlerConfig;
use crate::services::links::ContentKind;
use crate::utils::http;
use crate::utils::url::NormalizedUrl;

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    /// URL after redirects
    pub final_url: Url,
    pub content_type: Option<String>,
    /// Empty when the content type carries no links
    pub body: String,
}

impl FetchedPage {
    pub fn content_kind(&self) -> ContentKind {
        ContentKind::from_content_type(self.content_type.as_deref())
    }
}

/// Performs one GET request.
///
/// Headers, timeout and proxy are properties of the implementation, fixed
/// when it is constructed.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &NormalizedUrl) -> std::result::Result<FetchedPage, FetchError>;
}

/// reqwest-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with a client configured from crawler settings.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self::with_client(http::create_async_client(config)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &NormalizedUrl) -> std::result::Result<FetchedPage, FetchError> {
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = match ContentKind::from_content_type(content_type.as_deref()) {
            ContentKind::Html | ContentKind::Json => response.text().await?,
            ContentKind::Other => String::new(),
        };

        Ok(FetchedPage {
            status: status.as_u16(),
            final_url,
            content_type,
            body,
        })
    }
}
