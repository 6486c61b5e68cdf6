// src/error.rs

//! Unified error handling for the crawler application.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or used
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Exclusion pattern failed to compile
    #[error("Invalid pattern '{pattern}': {message}")]
    Regex { pattern: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The seed URL cannot start a crawl
    #[error("Invalid seed URL: {0}")]
    InvalidSeed(String),

    /// The seed URL itself could not be fetched
    #[error("Failed to fetch seed {url}: {source}")]
    SeedFetch {
        url: String,
        #[source]
        source: FetchError,
    },

    /// Record or export storage failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Create a pattern compilation error.
    pub fn regex(pattern: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Regex {
            pattern: pattern.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid seed error.
    pub fn invalid_seed(message: impl Into<String>) -> Self {
        Self::InvalidSeed(message.into())
    }

    /// Create a storage error.
    pub fn storage(message: impl fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }
}

/// Failure of a single fetch. Never fatal to the crawl, except for the seed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("HTTP status {status}")]
    Http { status: u16 },

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Discriminant used by records and counters.
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Timeout => FailureKind::Timeout,
            FetchError::Connection(_) => FailureKind::Connection,
            FetchError::Http { .. } => FailureKind::Http,
            FetchError::TooManyRedirects => FailureKind::TooManyRedirects,
            FetchError::Other(_) => FailureKind::Other,
        }
    }

    /// Status code carried by HTTP failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_redirect() {
            FetchError::TooManyRedirects
        } else if let Some(status) = error.status() {
            FetchError::Http {
                status: status.as_u16(),
            }
        } else if error.is_connect() {
            FetchError::Connection(error.to_string())
        } else {
            FetchError::Other(error.to_string())
        }
    }
}

/// Kind of fetch failure, as stored in crawl records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Connection,
    Http,
    TooManyRedirects,
    Other,
}
