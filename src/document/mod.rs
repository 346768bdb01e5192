//! Document model and metadata cache
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  MetadataCache                          │
//! │  (fingerprint → Document, idle-time eviction sweep)     │
//! └─────────────────────────────────────────────────────────┘
//!                            │ owns
//!                            ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │  {dataDir}/{fingerprint}/   raw file + expanded tree │
//!   └─────────────────────────────────────────────────────┘
//! ```
//!
//! A cache entry and its extraction directory live and die together: the
//! directory is created when the document is parsed and removed in the same
//! critical section that drops the entry.

mod cache;
mod error;
mod types;
mod urls;

pub use cache::{CacheConfig, MetadataCache, SweeperHandle};
pub use error::{DocumentError, Result};
pub use types::{Chapter, ChapterSource, Document, DocumentFormat, Resource, UNKNOWN};
pub use urls::{cover_url, resource_url, API_BASE};
