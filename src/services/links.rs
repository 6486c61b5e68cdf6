// src/services/links.rs

//! Candidate link extraction from HTML and JSON bodies.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use crate::utils::resolve_url;

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// Hrefs that never point at a crawlable page.
const SKIPPED_PREFIXES: &[&str] = &["#", "mailto:", "tel:", "javascript:", "data:"];

/// Body formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Json,
    Other,
}

impl ContentKind {
    /// Missing content types are treated as HTML.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return ContentKind::Html;
        };
        let lower = content_type.to_ascii_lowercase();
        if lower.contains("text/html") || lower.contains("application/xhtml") {
            ContentKind::Html
        } else if lower.contains("application/json") || lower.contains("+json") {
            ContentKind::Json
        } else {
            ContentKind::Other
        }
    }
}

/// Turns a page body into absolute candidate URLs.
///
/// Output is neither deduplicated nor validated; unresolvable hrefs are
/// passed through as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkExtractor;

impl LinkExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, body: &str, kind: ContentKind, base: &Url) -> Vec<String> {
        match kind {
            ContentKind::Html => self.extract_html(body, base),
            ContentKind::Json => self.extract_json(body, base),
            ContentKind::Other => Vec::new(),
        }
    }

    fn extract_html(&self, body: &str, base: &Url) -> Vec<String> {
        let document = Html::parse_document(body);
        document
            .select(&ANCHOR)
            .filter_map(|element| element.value().attr("href"))
            .map(str::trim)
            .filter(|href| !is_skipped(href))
            .map(|href| resolve_url(base, href))
            .collect()
    }

    fn extract_json(&self, body: &str, base: &Url) -> Vec<String> {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => {
                let mut urls = Vec::new();
                collect_json_urls(&value, base, &mut urls);
                urls
            }
            Err(e) => {
                log::debug!("Failed to parse JSON from {}: {}", base, e);
                Vec::new()
            }
        }
    }
}

fn is_skipped(href: &str) -> bool {
    if href.is_empty() {
        return true;
    }
    let lower = href.to_ascii_lowercase();
    SKIPPED_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

fn collect_json_urls(value: &Value, base: &Url, urls: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if s.starts_with("http://") || s.starts_with("https://") || s.starts_with('/') {
                urls.push(resolve_url(base, s));
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_json_urls(item, base, urls);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_json_urls(item, base, urls);
            }
        }
        _ => {}
    }
}
