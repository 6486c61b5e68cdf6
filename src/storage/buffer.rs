// src/storage/buffer.rs

//! Batched, background persistence of crawl records.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::models::CrawlRecord;
use crate::storage::{RecordSink, RecordStore};

struct Inner {
    store: Arc<dyn RecordStore>,
    buffer_size: usize,
    pending: Mutex<Vec<CrawlRecord>>,
    /// Serializes batch writes so records reach the store in append order
    write_lock: tokio::sync::Mutex<()>,
    full: Notify,
    shutdown: CancellationToken,
    written: AtomicUsize,
}

impl Inner {
    /// Write everything pending as one batch.
    ///
    /// On failure the batch is put back in front of anything appended
    /// meanwhile, so the next flush retries it.
    async fn flush(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let batch = std::mem::take(&mut *self.pending.lock());
        if batch.is_empty() {
            return Ok(0);
        }

        match self.store.write_batch(&batch).await {
            Ok(()) => {
                let count = batch.len();
                self.written.fetch_add(count, Ordering::Relaxed);
                log::debug!("Flushed {} records", count);
                Ok(count)
            }
            Err(e) => {
                let mut pending = self.pending.lock();
                let newer = std::mem::replace(&mut *pending, batch);
                pending.extend(newer);
                Err(e)
            }
        }
    }
}

/// Buffers records from the crawl engine and flushes them to a
/// [`RecordStore`] in batches of `buffer_size`.
///
/// A background task performs the writes, so [`RecordSink::append`] never
/// waits on storage. Call [`PersistenceBuffer::close`] at the end of the run;
/// records still pending when the buffer is dropped without closing are lost.
pub struct PersistenceBuffer {
    inner: Arc<Inner>,
    flusher: Mutex<Option<JoinHandle<()>>>,
}

impl PersistenceBuffer {
    /// Create the buffer and start its flusher on the current runtime.
    pub fn start(store: Arc<dyn RecordStore>, buffer_size: usize) -> Self {
        let inner = Arc::new(Inner {
            store,
            buffer_size: buffer_size.max(1),
            pending: Mutex::new(Vec::new()),
            write_lock: tokio::sync::Mutex::new(()),
            full: Notify::new(),
            shutdown: CancellationToken::new(),
            written: AtomicUsize::new(0),
        });
        let flusher = tokio::spawn(flush_loop(inner.clone()));

        Self {
            inner,
            flusher: Mutex::new(Some(flusher)),
        }
    }

    /// Records appended but not yet written.
    pub fn pending(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Records successfully written so far.
    pub fn written(&self) -> usize {
        self.inner.written.load(Ordering::Relaxed)
    }

    /// Write all pending records now.
    pub async fn flush(&self) -> Result<usize> {
        self.inner.flush().await
    }

    /// Stop the background flusher and force a final flush.
    pub async fn close(&self) -> Result<usize> {
        self.inner.shutdown.cancel();
        let flusher = self.flusher.lock().take();
        if let Some(handle) = flusher {
            if let Err(e) = handle.await {
                log::warn!("Record flusher task ended abnormally: {}", e);
            }
        }
        self.inner.flush().await
    }
}

impl RecordSink for PersistenceBuffer {
    fn append(&self, record: &CrawlRecord) {
        let full = {
            let mut pending = self.inner.pending.lock();
            pending.push(record.clone());
            pending.len() >= self.inner.buffer_size
        };
        if full {
            self.inner.full.notify_one();
        }
    }
}

async fn flush_loop(inner: Arc<Inner>) {
    loop {
        tokio::select! {
            _ = inner.shutdown.cancelled() => break,
            _ = inner.full.notified() => {}
        }
        if let Err(e) = inner.flush().await {
            log::warn!(
                "Failed to persist records ({} kept for retry): {}",
                inner.pending.lock().len(),
                e
            );
        }
    }
}
