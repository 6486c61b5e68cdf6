// src/utils/url.rs

//! URL normalization and classification against the target domain.
//!
//! Every URL is normalized before it reaches the visited registry, so two
//! spellings of the same resource claim the same slot:
//!
//! - host lower-cased, default ports (80/443) dropped (both done by the parser)
//! - fragment removed
//! - trailing slash removed, except for the root path
//! - empty query (`?`) removed; the query is otherwise part of identity
//!   unless `ignore_query` is set

use std::fmt;
use std::net::IpAddr;

use serde::{Serialize, Serializer};
use url::Url;

use crate::error::{AppError, Result};

/// An absolute `http(s)` URL in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    /// Parse and normalize, keeping the query string.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_with(raw, false)
    }

    /// Parse and normalize, optionally dropping the query string.
    pub fn parse_with(raw: &str, ignore_query: bool) -> Result<Self> {
        let url = Url::parse(raw.trim())?;
        Self::from_url(url, ignore_query)
    }

    /// Normalize an already parsed URL.
    pub fn from_url(mut url: Url, ignore_query: bool) -> Result<Self> {
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(AppError::validation(format!(
                    "unsupported scheme '{other}' in {url}"
                )));
            }
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(AppError::validation(format!("missing host in {url}")));
        }

        if let Some(host) = url.host_str().filter(|host| host.ends_with('.')) {
            let trimmed = host.trim_end_matches('.').to_string();
            url.set_host(Some(&trimmed))?;
        }

        url.set_fragment(None);
        if ignore_query || url.query() == Some("") {
            url.set_query(None);
        }

        let path = url.path();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/').to_string();
            if trimmed.is_empty() {
                url.set_path("/");
            } else {
                url.set_path(&trimmed);
            }
        }

        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Lower-cased host name.
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// Path plus query, the identity of a page within its host.
    pub fn path_and_query(&self) -> String {
        match self.0.query() {
            Some(query) => format!("{}?{}", self.0.path(), query),
            None => self.0.path().to_string(),
        }
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NormalizedUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Where a discovered URL sits relative to the crawl target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Same host as the seed (ignoring a leading `www.`)
    SameSubdomain,
    /// Another host under the seed's registered domain
    OtherSubdomainOfTarget,
    /// A different registered domain
    ExternalDomain,
    /// Could not be interpreted as a crawlable URL
    Malformed,
}

/// Target domain facts derived once from the seed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainContext {
    host: String,
    registered_domain: String,
    subdomain: String,
}

impl DomainContext {
    pub fn from_seed(seed: &NormalizedUrl) -> Self {
        let host = seed.host().to_string();
        let registered_domain = registered_domain(&host);
        let subdomain = subdomain_label(&host, &registered_domain)
            .unwrap_or_default()
            .to_string();

        Self {
            host,
            registered_domain,
            subdomain,
        }
    }

    /// Seed host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Registered domain (eTLD+1) of the seed.
    pub fn registered_domain(&self) -> &str {
        &self.registered_domain
    }

    /// Subdomain label of the seed, empty for a bare registered domain.
    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }

    pub fn classify(&self, url: &NormalizedUrl) -> Classification {
        let host = url.host();
        if host.is_empty() {
            return Classification::Malformed;
        }
        if strip_www(host) == strip_www(&self.host) {
            return Classification::SameSubdomain;
        }
        if registered_domain(host) == self.registered_domain {
            Classification::OtherSubdomainOfTarget
        } else {
            Classification::ExternalDomain
        }
    }

    /// The URL's host, if it carries a subdomain label under the target domain.
    /// A bare `www` label does not count.
    pub fn subdomain_host<'a>(&self, url: &'a NormalizedUrl) -> Option<&'a str> {
        let host = url.host();
        subdomain_label(host, &self.registered_domain)
            .filter(|label| *label != "www")
            .map(|_| host)
    }
}

/// Registered domain (eTLD+1) of a host.
///
/// IP addresses and hosts without a public suffix (`localhost`) are their
/// own registered domain.
pub fn registered_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return host;
    }
    psl::domain_str(&host)
        .map(str::to_string)
        .unwrap_or(host)
}

/// Label(s) in front of the registered domain, if any.
fn subdomain_label<'a>(host: &'a str, registered: &str) -> Option<&'a str> {
    host.strip_suffix(registered)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .filter(|label| !label.is_empty())
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
