// src/services/filter.rs

//! Path and subdomain exclusion.

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::FilterConfig;
use crate::utils::url::NormalizedUrl;

/// Compiled deny-lists. An unset pattern never excludes.
#[derive(Debug, Clone, Default)]
pub struct ExclusionPolicy {
    paths: Option<Regex>,
    subdomains: Option<Regex>,
}

impl ExclusionPolicy {
    pub fn new(paths: Option<&str>, subdomains: Option<&str>) -> Result<Self> {
        Ok(Self {
            paths: paths.map(compile).transpose()?,
            subdomains: subdomains.map(compile).transpose()?,
        })
    }

    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        Self::new(
            config.exclude_paths.as_deref(),
            config.exclude_subdomains.as_deref(),
        )
    }

    /// Whether the URL is denied. `subdomain` is the URL's host when it
    /// carries a subdomain label other than a bare `www`, `None` otherwise.
    pub fn is_excluded(&self, url: &NormalizedUrl, subdomain: Option<&str>) -> bool {
        let path_hit = self
            .paths
            .as_ref()
            .is_some_and(|re| re.is_match(url.path()));
        let subdomain_hit = match (&self.subdomains, subdomain) {
            (Some(re), Some(host)) => re.is_match(host),
            _ => false,
        };
        path_hit || subdomain_hit
    }

    /// No pattern configured.
    pub fn is_empty(&self) -> bool {
        self.paths.is_none() && self.subdomains.is_none()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| AppError::regex(pattern, e))
}
