//! Document data types
//!
//! Core types for representing a resolved, chapterized document.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Title and author used when a format carries no metadata
pub const UNKNOWN: &str = "Unknown";

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Zip-packaged EPUB archive
    Epub,
    /// Flat text file
    Txt,
}

impl DocumentFormat {
    /// Match a lowercase extension or format name
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "epub" => Some(Self::Epub),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Epub => "epub",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed document, immutable once it enters the cache
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Fingerprint of the source locator
    pub id: String,
    pub title: String,
    pub author: String,
    pub format: DocumentFormat,
    /// Stable cover-fetch reference, present only when a cover was found
    pub cover_url: Option<String>,
    /// Chapters in reading order
    pub chapters: Vec<Chapter>,

    /// `{dataDir}/{fingerprint}`, owned by the cache entry holding this document
    #[serde(skip)]
    pub extraction_dir: PathBuf,
    /// Cover image inside the extraction directory
    #[serde(skip)]
    pub cover_path: Option<PathBuf>,
}

impl Document {
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }
}

/// One chapter of a document
#[derive(Debug, Clone, Serialize)]
pub struct Chapter {
    /// 0-based position in reading order
    pub id: usize,
    pub title: String,
    #[serde(skip)]
    pub source: ChapterSource,
}

/// Where a chapter's content lives on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterSource {
    /// Byte span inside a text file
    Span {
        path: PathBuf,
        offset: u64,
        length: u64,
    },
    /// Whole file (archive formats)
    File { path: PathBuf },
}

impl ChapterSource {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Span { path, .. } | Self::File { path } => path,
        }
    }
}

/// Resource content (images, CSS, fonts, covers)
#[derive(Debug, Clone)]
pub struct Resource {
    /// Path relative to the extraction directory
    pub href: String,
    /// MIME type inferred from the extension
    pub media_type: String,
    /// Raw bytes
    pub data: Vec<u8>,
}
