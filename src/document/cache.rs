//! Metadata cache with idle-time eviction
//!
//! Keeps parsed documents in memory keyed by fingerprint. A background
//! sweeper evicts entries that have not been read for longer than the TTL and
//! deletes their extraction directories.
//!
//! # Thread Safety
//!
//! The entry map sits behind a `tokio::sync::RwLock`. `get` takes the write
//! lock because it bumps the access timestamp; eviction re-checks idleness
//! under the same write lock right before removing an entry, so a read that
//! lands between the scan and the delete keeps the entry alive.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::Document;

/// Default idle time before an entry is evicted
const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;
/// Default period between eviction sweeps
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 10 * 60;

/// Cache configuration options
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Idle time after which an entry becomes eligible for eviction
    pub ttl: Duration,
    /// Period of the background sweep
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

struct CacheEntry {
    document: Arc<Document>,
    last_access: Instant,
}

impl CacheEntry {
    fn is_idle(&self, ttl: Duration) -> bool {
        self.last_access.elapsed() > ttl
    }
}

/// Thread-safe document cache
#[derive(Clone)]
pub struct MetadataCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    /// Root under which every `{fingerprint}/` extraction directory lives
    data_dir: PathBuf,
    config: CacheConfig,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MetadataCache {
    /// Create an empty cache rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                data_dir: data_dir.into(),
                config,
                entries: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Get a cached document, bumping its last-access time on hit
    pub async fn get(&self, fingerprint: &str) -> Option<Arc<Document>> {
        let mut entries = self.inner.entries.write().await;
        let entry = entries.get_mut(fingerprint)?;
        entry.last_access = Instant::now();
        Some(entry.document.clone())
    }

    /// Insert or replace a document, setting its last-access time to now
    pub async fn put(&self, fingerprint: &str, document: Document) -> Arc<Document> {
        let document = Arc::new(document);
        let mut entries = self.inner.entries.write().await;
        entries.insert(
            fingerprint.to_string(),
            CacheEntry {
                document: document.clone(),
                last_access: Instant::now(),
            },
        );
        document
    }

    /// Check presence without touching the access time
    pub async fn contains(&self, fingerprint: &str) -> bool {
        let entries = self.inner.entries.read().await;
        entries.contains_key(fingerprint)
    }

    /// Get the number of cached documents
    pub async fn len(&self) -> usize {
        let entries = self.inner.entries.read().await;
        entries.len()
    }

    /// Check if cache is empty
    pub async fn is_empty(&self) -> bool {
        let entries = self.inner.entries.read().await;
        entries.is_empty()
    }

    /// Evict every entry idle for longer than the TTL
    ///
    /// Returns the number of evicted entries. Directory deletion failures are
    /// logged and do not stop the sweep.
    pub async fn sweep(&self) -> usize {
        let ttl = self.inner.config.ttl;

        let candidates: Vec<String> = {
            let entries = self.inner.entries.read().await;
            entries
                .iter()
                .filter(|(_, entry)| entry.is_idle(ttl))
                .map(|(fingerprint, _)| fingerprint.clone())
                .collect()
        };

        let mut evicted = 0;
        for fingerprint in candidates {
            let mut entries = self.inner.entries.write().await;

            // A get may have landed since the scan
            let still_idle = entries
                .get(&fingerprint)
                .map(|entry| entry.is_idle(ttl))
                .unwrap_or(false);
            if !still_idle {
                continue;
            }

            entries.remove(&fingerprint);
            evicted += 1;

            let dir = self.inner.data_dir.join(&fingerprint);
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => {
                    tracing::info!(fingerprint = %fingerprint, "Evicted idle document");
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!(
                        fingerprint = %fingerprint,
                        "Evicted idle document with no extraction directory"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        fingerprint = %fingerprint,
                        dir = %dir.display(),
                        error = %e,
                        "Failed to delete extraction directory"
                    );
                }
            }
        }

        evicted
    }

    /// Spawn the periodic eviction sweep
    ///
    /// The sweep runs until [`SweeperHandle::shutdown`] is called or the
    /// handle is dropped.
    pub fn start_sweeper(&self) -> SweeperHandle {
        let cache = self.clone();
        let period = self.inner.config.sweep_interval.max(Duration::from_millis(1));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = cache.sweep().await;
                        if evicted > 0 {
                            tracing::debug!(evicted, "Cache sweep complete");
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("Cache sweeper stopped");
                        break;
                    }
                }
            }
        });

        tracing::info!(
            interval_secs = period.as_secs_f64(),
            ttl_secs = self.inner.config.ttl.as_secs_f64(),
            "Cache sweeper started"
        );

        SweeperHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Handle to the background sweep task
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweep and wait for the task to finish
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "Cache sweeper ended abnormally");
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Chapter, ChapterSource, DocumentFormat};
    use std::path::Path;
    use tempfile::TempDir;

    fn sample_document(data_dir: &Path, fingerprint: &str) -> Document {
        let extraction_dir = data_dir.join(fingerprint);
        Document {
            id: fingerprint.to_string(),
            title: "Sample".to_string(),
            author: "Someone".to_string(),
            format: DocumentFormat::Txt,
            cover_url: None,
            chapters: vec![Chapter {
                id: 0,
                title: "Section 1".to_string(),
                source: ChapterSource::Span {
                    path: extraction_dir.join("raw.txt"),
                    offset: 0,
                    length: 5,
                },
            }],
            extraction_dir,
            cover_path: None,
        }
    }

    fn cache_with_ttl(data_dir: &Path, ttl: Duration) -> MetadataCache {
        MetadataCache::new(
            data_dir,
            CacheConfig {
                ttl,
                sweep_interval: Duration::from_millis(20),
            },
        )
    }

    #[tokio::test]
    async fn test_cache_creation() {
        let cache = MetadataCache::new("data", CacheConfig::default());
        assert!(cache.is_empty().await);
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.config().ttl, Duration::from_secs(DEFAULT_TTL_SECS));
    }

    #[tokio::test]
    async fn test_put_then_get_returns_same_document() {
        let temp_dir = TempDir::new().unwrap();
        let cache = MetadataCache::new(temp_dir.path(), CacheConfig::default());

        let stored = cache.put("fp1", sample_document(temp_dir.path(), "fp1")).await;
        let fetched = cache.get("fp1").await.unwrap();

        assert!(Arc::ptr_eq(&stored, &fetched));
        assert!(cache.get("missing").await.is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_evicts_idle_entry_and_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_with_ttl(temp_dir.path(), Duration::from_millis(50));

        let dir = temp_dir.path().join("fp1");
        std::fs::create_dir_all(dir.join("OEBPS")).unwrap();
        std::fs::write(dir.join("OEBPS/c1.xhtml"), "<p>hi</p>").unwrap();
        cache.put("fp1", sample_document(temp_dir.path(), "fp1")).await;

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(cache.sweep().await, 1);
        assert!(!cache.contains("fp1").await);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_sweep_uses_idle_time_not_age() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_with_ttl(temp_dir.path(), Duration::from_millis(300));
        cache.put("fp1", sample_document(temp_dir.path(), "fp1")).await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(cache.get("fp1").await.is_some());
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Older than the TTL, but read recently
        assert_eq!(cache.sweep().await, 0);
        assert!(cache.contains("fp1").await);
    }

    #[tokio::test]
    async fn test_sweep_tolerates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_with_ttl(temp_dir.path(), Duration::from_millis(10));
        cache.put("gone", sample_document(temp_dir.path(), "gone")).await;
        cache.put("also-gone", sample_document(temp_dir.path(), "also-gone")).await;

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(cache.sweep().await, 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_background_sweeper_evicts_and_stops() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_with_ttl(temp_dir.path(), Duration::from_millis(30));

        let dir = temp_dir.path().join("fp1");
        std::fs::create_dir_all(&dir).unwrap();
        cache.put("fp1", sample_document(temp_dir.path(), "fp1")).await;

        let sweeper = cache.start_sweeper();
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(!cache.contains("fp1").await);
        assert!(!dir.exists());

        sweeper.shutdown().await;
    }
}
