//! Document resolution service
//!
//! Turns a source locator into a cached [`Document`]: cache hit, or
//! fetch → parse → cache under one in-flight operation per fingerprint.

use std::path::Path;
use std::sync::Arc;

use crate::document::{
    cover_url, Document, DocumentError, MetadataCache, Resource, Result, UNKNOWN,
};
use crate::fetch::{fingerprint, is_fingerprint, FetchCoordinator, SingleFlight};
use crate::formats::{DocumentParser, ParserOptions};
use crate::storage::{extension_from_locator, sandbox, title_from_locator};

/// Resolves locators to documents and serves their chapters and resources
#[derive(Clone)]
pub struct ResolutionService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    fetcher: FetchCoordinator,
    cache: MetadataCache,
    loads: SingleFlight<Arc<Document>>,
    options: ParserOptions,
}

impl ResolutionService {
    pub fn new(fetcher: FetchCoordinator, cache: MetadataCache, options: ParserOptions) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                fetcher,
                cache,
                loads: SingleFlight::new(),
                options,
            }),
        }
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.inner.cache
    }

    /// Cached document for `locator`, fetching and parsing it on a miss
    pub async fn resolve(&self, locator: &str) -> Result<Arc<Document>> {
        let fp = fingerprint(locator);
        if let Some(document) = self.inner.cache.get(&fp).await {
            tracing::debug!(fingerprint = %fp, "Cache hit");
            return Ok(document);
        }
        tracing::debug!(fingerprint = %fp, locator = %locator, "Cache miss");

        let service = self.clone();
        let locator = locator.to_string();
        let key = fp.clone();
        self.inner
            .loads
            .run(&fp, async move { service.load(&locator, &key).await })
            .await
    }

    async fn load(&self, locator: &str, fp: &str) -> Result<Arc<Document>> {
        // Another load may have finished between the miss and joining the flight
        if let Some(document) = self.inner.cache.get(fp).await {
            return Ok(document);
        }

        let parser = DocumentParser::for_name(&extension_from_locator(locator), &self.inner.options)?;
        let fetched = self.inner.fetcher.fetch(locator).await?;

        let raw = fetched.file_path.clone();
        let dir = fetched.extraction_dir.clone();
        let parsed = tokio::task::spawn_blocking(move || parser.parse(&raw, &dir)).await?;

        let mut document = match parsed {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(fingerprint = %fp, error = %e, "Parse failed");
                discard_extraction_dir(&fetched.extraction_dir).await;
                return Err(e);
            }
        };

        document.id = fp.to_string();
        if document.title.trim().is_empty() {
            document.title = title_from_locator(locator).unwrap_or_else(|| UNKNOWN.to_string());
        }
        if document.author.trim().is_empty() {
            document.author = UNKNOWN.to_string();
        }
        document.cover_url = document.cover_path.as_ref().map(|_| cover_url(fp));

        tracing::info!(
            fingerprint = %fp,
            format = %document.format,
            chapters = document.chapter_count(),
            "Parsed document"
        );
        Ok(self.inner.cache.put(fp, document).await)
    }

    /// Render chapter `index` of a resolved document
    pub async fn chapter(&self, document: Arc<Document>, index: usize) -> Result<String> {
        let parser = DocumentParser::for_format(document.format, &self.inner.options);
        tokio::task::spawn_blocking(move || parser.read_chapter(&document, index, &document.id))
            .await?
    }

    /// A file from a cached document's extraction directory
    ///
    /// The path is checked for containment before the cache or the
    /// filesystem is consulted.
    pub async fn resource(&self, fp: &str, relative_path: &str) -> Result<Resource> {
        if !is_fingerprint(fp) {
            return Err(DocumentError::NotFound(format!("document {}", fp)));
        }
        let root = self.inner.fetcher.layout().extraction_dir(fp);
        let path = sandbox::contain(&root, relative_path).map_err(|e| {
            tracing::warn!(fingerprint = %fp, path = %relative_path, "Rejected resource path outside extraction directory");
            e
        })?;

        let document = self.cached(fp).await?;
        let href = sandbox::relative_slash_path(&document.extraction_dir, &path)
            .unwrap_or_else(|| relative_path.to_string());
        read_resource(&path, href).await
    }

    /// Cover image of a cached document
    pub async fn cover(&self, fp: &str) -> Result<Resource> {
        if !is_fingerprint(fp) {
            return Err(DocumentError::NotFound(format!("document {}", fp)));
        }
        let document = self.cached(fp).await?;
        let path = document
            .cover_path
            .as_ref()
            .ok_or_else(|| DocumentError::NotFound(format!("cover for {}", fp)))?;
        let href = sandbox::relative_slash_path(&document.extraction_dir, path)
            .unwrap_or_default();
        read_resource(path, href).await
    }

    async fn cached(&self, fp: &str) -> Result<Arc<Document>> {
        self.inner
            .cache
            .get(fp)
            .await
            .ok_or_else(|| DocumentError::NotFound(format!("document {}", fp)))
    }
}

async fn read_resource(path: &Path, href: String) -> Result<Resource> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DocumentError::NotFound(format!("resource {}", href)));
        }
        Err(e) => return Err(e.into()),
    };
    let media_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(Resource {
        href,
        media_type,
        data,
    })
}

/// Best-effort removal of a directory whose document never reached the cache
async fn discard_extraction_dir(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => tracing::debug!(dir = %dir.display(), "Removed extraction directory"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove extraction directory")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CacheConfig, DocumentFormat};
    use crate::fetch::test_server::TestServer;
    use crate::formats::epub::fixtures::sample_epub_bytes;
    use crate::storage::StorageLayout;
    use std::time::Duration;
    use tempfile::TempDir;

    fn service(data_dir: &Path, config: CacheConfig) -> ResolutionService {
        ResolutionService::new(
            FetchCoordinator::new(StorageLayout::new(data_dir)),
            MetadataCache::new(data_dir, config),
            ParserOptions::default(),
        )
    }

    fn text_book() -> Vec<u8> {
        "第一章 开始\n内容一\n第二章 继续\n内容二\n".as_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_resolve_epub() {
        let server = TestServer::start(vec![("book.epub", sample_epub_bytes())], Duration::ZERO).await;
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path(), CacheConfig::default());

        let url = server.url("book.epub");
        let doc = service.resolve(&url).await.unwrap();

        let fp = fingerprint(&url);
        assert_eq!(doc.id, fp);
        assert_eq!(doc.title, "X");
        assert_eq!(doc.author, "Y");
        assert_eq!(doc.format, DocumentFormat::Epub);
        assert_eq!(doc.chapter_count(), 3);
        assert_eq!(doc.cover_url.as_deref(), Some(format!("/api/book/cover/{}", fp).as_str()));
    }

    #[tokio::test]
    async fn test_text_title_falls_back_to_file_stem() {
        let server = TestServer::start(vec![("My Novel.txt", text_book())], Duration::ZERO).await;
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path(), CacheConfig::default());

        let doc = service.resolve(&server.url("My%20Novel.txt")).await.unwrap();

        assert_eq!(doc.title, "My Novel");
        assert_eq!(doc.author, UNKNOWN);
        assert!(doc.cover_url.is_none());
        assert_eq!(doc.chapter_count(), 2);
    }

    #[tokio::test]
    async fn test_second_resolve_is_cache_hit() {
        let server = TestServer::start(vec![("a.txt", text_book())], Duration::ZERO).await;
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path(), CacheConfig::default());
        let url = server.url("a.txt");

        let first = service.resolve(&url).await.unwrap();
        let second = service.resolve(&url).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolves_share_one_transfer() {
        let server =
            TestServer::start(vec![("a.epub", sample_epub_bytes())], Duration::from_millis(200)).await;
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path(), CacheConfig::default());
        let url = server.url("a.epub");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            let url = url.clone();
            handles.push(tokio::spawn(async move { service.resolve(&url).await }));
        }
        let mut documents = Vec::new();
        for handle in handles {
            documents.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(server.hits(), 1);
        assert!(documents.iter().all(|d| Arc::ptr_eq(d, &documents[0])));
    }

    #[tokio::test]
    async fn test_unsupported_extension_never_fetches() {
        let server = TestServer::start(vec![("scan.pdf", b"%PDF".to_vec())], Duration::ZERO).await;
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path(), CacheConfig::default());

        let result = service.resolve(&server.url("scan.pdf")).await;

        assert!(matches!(result, Err(DocumentError::UnsupportedFormat(_))));
        assert_eq!(server.hits(), 0);
    }

    #[tokio::test]
    async fn test_failed_parse_leaves_nothing_behind() {
        let server = TestServer::start(vec![("bad.epub", b"not a zip".to_vec())], Duration::ZERO).await;
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path(), CacheConfig::default());
        let url = server.url("bad.epub");

        let result = service.resolve(&url).await;

        assert!(matches!(result, Err(DocumentError::Corrupt(_))));
        assert!(service.cache().is_empty().await);
        assert!(!temp_dir.path().join(fingerprint(&url)).exists());
    }

    #[tokio::test]
    async fn test_chapter_rendering() {
        let server = TestServer::start(vec![("a.txt", text_book())], Duration::ZERO).await;
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path(), CacheConfig::default());

        let doc = service.resolve(&server.url("a.txt")).await.unwrap();
        let html = service.chapter(doc.clone(), 1).await.unwrap();
        assert!(html.contains("<p>内容二</p>"));

        let out_of_range = service.chapter(doc, 2).await;
        assert!(matches!(
            out_of_range,
            Err(DocumentError::ChapterOutOfRange { index: 2, count: 2 })
        ));
    }

    #[tokio::test]
    async fn test_resource_and_cover() {
        let server = TestServer::start(vec![("a.epub", sample_epub_bytes())], Duration::ZERO).await;
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path(), CacheConfig::default());
        let doc = service.resolve(&server.url("a.epub")).await.unwrap();

        let css = service.resource(&doc.id, "OEBPS/Styles/main.css").await.unwrap();
        assert_eq!(css.media_type, "text/css");
        assert_eq!(css.href, "OEBPS/Styles/main.css");
        assert_eq!(css.data, b"body { margin: 0; }");

        let cover = service.cover(&doc.id).await.unwrap();
        assert_eq!(cover.media_type, "image/jpeg");
        assert_eq!(cover.href, "OEBPS/Images/cover.jpg");

        let missing = service.resource(&doc.id, "OEBPS/nope.png").await;
        assert!(matches!(missing, Err(DocumentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_resource_traversal_rejected() {
        let server = TestServer::start(vec![("a.epub", sample_epub_bytes())], Duration::ZERO).await;
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path(), CacheConfig::default());
        let doc = service.resolve(&server.url("a.epub")).await.unwrap();
        std::fs::write(temp_dir.path().join("secret"), b"top secret").unwrap();

        let result = service.resource(&doc.id, "../../secret").await;
        assert!(matches!(result, Err(DocumentError::PathEscape(_))));

        let result = service.resource(&doc.id, "../secret").await;
        assert!(matches!(result, Err(DocumentError::PathEscape(_))));
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_fingerprint_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path(), CacheConfig::default());

        let unknown = service.cover(&fingerprint("never resolved")).await;
        assert!(matches!(unknown, Err(DocumentError::NotFound(_))));

        let malformed = service.resource("..", "etc/passwd").await;
        assert!(matches!(malformed, Err(DocumentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_idle_document_is_evicted() {
        let server = TestServer::start(vec![("a.txt", text_book())], Duration::ZERO).await;
        let temp_dir = TempDir::new().unwrap();
        let config = CacheConfig {
            ttl: Duration::from_millis(50),
            sweep_interval: Duration::from_secs(60),
        };
        let service = service(temp_dir.path(), config);
        let url = server.url("a.txt");

        let doc = service.resolve(&url).await.unwrap();
        assert!(doc.extraction_dir.exists());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(service.cache().sweep().await, 1);
        assert!(!doc.extraction_dir.exists());

        // Next resolve starts over from the network
        service.resolve(&url).await.unwrap();
        assert_eq!(server.hits(), 2);
    }
}
