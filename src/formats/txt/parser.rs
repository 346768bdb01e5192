//! Plain text parsing: decode, then split into chapters by heading lines

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::document::{Chapter, ChapterSource, Document, DocumentFormat, Result};

use super::decode::decode_text;

/// Default size of a chapter window when the text has no headings
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// UTF-8 copy of a text whose raw bytes were in another encoding
pub const CONVERTED_FILE_NAME: &str = "content.txt";

/// Chapter heading lines: "第十二章 ...", "Chapter 3 ..."
static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t\u{3000}]*(?:第[零〇一二两三四五六七八九十百千万0-9０-９]+[章节回卷集部篇]|(?i:chapter)[ \t]+[0-9]+).*$",
    )
    .expect("heading pattern is valid")
});

/// Flat text document parser
#[derive(Debug, Clone, Copy)]
pub struct TxtParser {
    chunk_size: usize,
}

impl Default for TxtParser {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl TxtParser {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Decode `raw_path` and index its chapters as byte spans
    ///
    /// Spans point into the raw file when it is UTF-8, otherwise into a
    /// UTF-8 copy written to the extraction directory.
    pub fn parse(&self, raw_path: &Path, extraction_dir: &Path) -> Result<Document> {
        let decoded = decode_text(fs::read(raw_path)?);

        let text_path = if decoded.converted {
            fs::create_dir_all(extraction_dir)?;
            let path = extraction_dir.join(CONVERTED_FILE_NAME);
            fs::write(&path, decoded.text.as_bytes())?;
            path
        } else {
            raw_path.to_path_buf()
        };

        let chapters = self.segment(&decoded.text, &text_path);
        tracing::debug!(
            encoding = decoded.encoding,
            chapters = chapters.len(),
            path = %text_path.display(),
            "Segmented plain text"
        );

        Ok(Document {
            id: String::new(),
            title: String::new(),
            author: String::new(),
            format: DocumentFormat::Txt,
            cover_url: None,
            chapters,
            extraction_dir: extraction_dir.to_path_buf(),
            cover_path: None,
        })
    }

    /// Chapters for `text`, whose bytes are stored at `path`
    pub fn segment(&self, text: &str, path: &Path) -> Vec<Chapter> {
        let headings: Vec<(usize, &str)> = HEADING
            .find_iter(text)
            .map(|m| (m.start(), m.as_str()))
            .collect();
        if headings.is_empty() {
            return split_by_size(text, path, self.chunk_size);
        }

        headings
            .iter()
            .enumerate()
            .map(|(index, (start, heading))| {
                let end = headings
                    .get(index + 1)
                    .map(|(next, _)| *next)
                    .unwrap_or(text.len());
                Chapter {
                    id: index,
                    title: heading_title(heading),
                    source: ChapterSource::Span {
                        path: path.to_path_buf(),
                        offset: *start as u64,
                        length: (end - start) as u64,
                    },
                }
            })
            .collect()
    }
}

fn heading_title(heading: &str) -> String {
    heading.lines().next().unwrap_or_default().trim().to_string()
}

/// Fixed-size windows, each end moved forward to a character boundary
fn split_by_size(text: &str, path: &Path, chunk_size: usize) -> Vec<Chapter> {
    let total = text.len();
    let mut chapters = Vec::with_capacity(total / chunk_size + 1);
    let mut start = 0;
    while start < total {
        let mut end = (start + chunk_size).min(total);
        while !text.is_char_boundary(end) {
            end += 1;
        }
        let index = chapters.len();
        chapters.push(Chapter {
            id: index,
            title: format!("Section {}", index + 1),
            source: ChapterSource::Span {
                path: path.to_path_buf(),
                offset: start as u64,
                length: (end - start) as u64,
            },
        });
        start = end;
    }
    chapters
}
