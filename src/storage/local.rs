//! Local filesystem record store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::CrawlRecord;
use crate::storage::RecordStore;

/// Appends records as JSON Lines to a single file.
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonLinesStore {
    async fn write_batch(&self, records: &[CrawlRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.ensure_dir().await?;

        let mut bytes = Vec::new();
        for record in records {
            serde_json::to_writer(&mut bytes, record)?;
            bytes.push(b'\n');
        }

        // The whole batch goes out in one write so lines never interleave.
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKind;
    use crate::utils::url::NormalizedUrl;
    use tempfile::TempDir;

    fn record(path: &str) -> CrawlRecord {
        let url = NormalizedUrl::parse(&format!("https://example.com{path}")).unwrap();
        CrawlRecord::discovered(url, RecordKind::Path, 1)
    }

    #[tokio::test]
    async fn test_batches_append_lines() {
        let tmp = TempDir::new().unwrap();
        let store = JsonLinesStore::new(tmp.path().join("nested/records.jsonl"));

        store.write_batch(&[record("/a"), record("/b")]).await.unwrap();
        store.write_batch(&[record("/c")]).await.unwrap();

        let content = tokio::fs::read_to_string(store.path()).await.unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["url"], "https://example.com/a");
        assert_eq!(lines[0]["kind"], "path");
        assert_eq!(lines[0]["status"], "discovered");
        assert_eq!(lines[0]["depth"], 1);
        assert_eq!(lines[2]["url"], "https://example.com/c");
    }

    #[tokio::test]
    async fn test_empty_batch_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = JsonLinesStore::new(tmp.path().join("records.jsonl"));
        store.write_batch(&[]).await.unwrap();
        assert!(!store.path().exists());
    }
}
