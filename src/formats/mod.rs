//! Format-specific document implementations
//!
//! # Architecture
//!
//! Each format module provides a parser that:
//! - `parse`: turns a fetched raw file into a [`Document`] with its chapter list
//! - `read_chapter`: renders one chapter to HTML on demand
//!
//! [`DocumentParser`] is the closed set of formats, selected by file
//! extension or format name. Parsing and chapter reads do blocking file I/O
//! and are meant to run on the blocking pool.

pub mod epub;
pub mod txt;

use std::path::Path;

use crate::document::{Document, DocumentError, DocumentFormat, Result};

pub use epub::EpubParser;
pub use txt::TxtParser;

/// Options shared by all parsers
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    /// Window size in bytes for plain text without headings
    pub txt_chunk_size: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            txt_chunk_size: txt::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Parser for one supported format
#[derive(Debug, Clone, Copy)]
pub enum DocumentParser {
    /// Zip-packaged EPUB
    Archive(EpubParser),
    /// Flat text
    PlainText(TxtParser),
}

impl DocumentParser {
    pub fn for_format(format: DocumentFormat, options: &ParserOptions) -> Self {
        match format {
            DocumentFormat::Epub => Self::Archive(EpubParser::new()),
            DocumentFormat::Txt => Self::PlainText(TxtParser::new(options.txt_chunk_size)),
        }
    }

    /// Select by file name or path (`book.EPUB`) or bare format name (`txt`)
    pub fn for_name(name: &str, options: &ParserOptions) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(name);
        DocumentFormat::from_extension(ext)
            .map(|format| Self::for_format(format, options))
            .ok_or_else(|| DocumentError::UnsupportedFormat(ext.to_string()))
    }

    pub fn format(&self) -> DocumentFormat {
        match self {
            Self::Archive(_) => DocumentFormat::Epub,
            Self::PlainText(_) => DocumentFormat::Txt,
        }
    }

    /// Parse `raw_path` into a document whose files live in `extraction_dir`
    pub fn parse(&self, raw_path: &Path, extraction_dir: &Path) -> Result<Document> {
        match self {
            Self::Archive(parser) => parser.parse(raw_path, extraction_dir),
            Self::PlainText(parser) => parser.parse(raw_path, extraction_dir),
        }
    }

    /// Render chapter `index` of `document` to HTML
    pub fn read_chapter(
        &self,
        document: &Document,
        index: usize,
        fingerprint: &str,
    ) -> Result<String> {
        let chapter = document
            .chapters
            .get(index)
            .ok_or(DocumentError::ChapterOutOfRange {
                index,
                count: document.chapter_count(),
            })?;

        match self {
            Self::Archive(parser) => parser.read_chapter(document, chapter, fingerprint),
            Self::PlainText(parser) => parser.read_chapter(chapter),
        }
    }
}
