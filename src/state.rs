//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::document::MetadataCache;
use crate::fetch::FetchCoordinator;
use crate::library::ResolutionService;
use crate::storage::StorageLayout;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    service: ResolutionService,
}

impl AppState {
    /// Wire the resolution pipeline for `config`
    ///
    /// The cache sweeper is not started here; its lifetime belongs to the caller.
    pub fn new(config: &Config) -> Self {
        let data_dir = &config.storage.data_dir;
        let fetcher = FetchCoordinator::new(StorageLayout::new(data_dir));
        let cache = MetadataCache::new(data_dir, config.cache_config());
        let service = ResolutionService::new(fetcher, cache, config.parser_options());
        Self {
            inner: Arc::new(AppStateInner { service }),
        }
    }

    /// Get the resolution service
    pub fn service(&self) -> &ResolutionService {
        &self.inner.service
    }

    /// Get the metadata cache
    pub fn cache(&self) -> &MetadataCache {
        self.inner.service.cache()
    }
}
