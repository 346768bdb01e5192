//! EPUB chapter reading

use std::fs;

use crate::document::{Chapter, Document, Result};
use crate::html::{rewrite_resource_urls, ChapterBase};

use super::parser::EpubParser;

impl EpubParser {
    /// Read a spine item's markup with resource references pointed at the
    /// resource endpoint for `fingerprint`
    pub fn read_chapter(
        &self,
        document: &Document,
        chapter: &Chapter,
        fingerprint: &str,
    ) -> Result<String> {
        let path = chapter.source.path();
        let bytes = fs::read(path)?;
        let markup = String::from_utf8_lossy(&bytes);

        let base = ChapterBase {
            root: document.extraction_dir.as_path(),
            chapter_dir: path.parent().unwrap_or(document.extraction_dir.as_path()),
            fingerprint,
        };
        Ok(rewrite_resource_urls(&markup, &base))
    }
}
