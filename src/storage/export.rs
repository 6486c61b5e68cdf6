//! Final result export (TXT or JSON).

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::{Counters, CrawlStats, ResultSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// `{prefix}_subdomains.txt` and `{prefix}_paths.txt`
    #[default]
    Text,
    /// `{prefix}_results.json`
    Json,
}

#[derive(Serialize)]
struct JsonExport<'a> {
    subdomains: &'a BTreeSet<String>,
    paths: &'a BTreeSet<String>,
    visited_urls: &'a BTreeSet<String>,
    stats: ExportStats<'a>,
}

#[derive(Serialize)]
struct ExportStats<'a> {
    total_subdomains: usize,
    total_paths: usize,
    total_visited: usize,
    counters: &'a Counters,
    metrics: &'a CrawlStats,
}

/// Writes a result set to files named after a common prefix.
#[derive(Debug, Clone)]
pub struct ResultExporter {
    prefix: PathBuf,
    format: ExportFormat,
}

impl ResultExporter {
    pub fn new(prefix: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            prefix: prefix.into(),
            format,
        }
    }

    /// Write the export files, returning their paths.
    pub async fn export(&self, results: &ResultSet, stats: &CrawlStats) -> Result<Vec<PathBuf>> {
        match self.format {
            ExportFormat::Text => {
                let subdomains = self.file_path("_subdomains.txt");
                let paths = self.file_path("_paths.txt");
                write_atomic(&subdomains, lines(&results.subdomains).as_bytes()).await?;
                write_atomic(&paths, lines(&results.paths).as_bytes()).await?;
                Ok(vec![subdomains, paths])
            }
            ExportFormat::Json => {
                let path = self.file_path("_results.json");
                let export = JsonExport {
                    subdomains: &results.subdomains,
                    paths: &results.paths,
                    visited_urls: &results.visited,
                    stats: ExportStats {
                        total_subdomains: results.subdomains.len(),
                        total_paths: results.paths.len(),
                        total_visited: results.visited.len(),
                        counters: &results.counters,
                        metrics: stats,
                    },
                };
                let bytes = serde_json::to_vec_pretty(&export)?;
                write_atomic(&path, &bytes).await?;
                Ok(vec![path])
            }
        }
    }

    fn file_path(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.prefix.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }
}

fn lines(items: &BTreeSet<String>) -> String {
    items.iter().fold(String::new(), |mut out, item| {
        out.push_str(item);
        out.push('\n');
        out
    })
}

/// Write bytes atomically (write to temp, then rename).
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
