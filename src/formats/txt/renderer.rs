//! Plain text chapter reading

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use crate::document::{Chapter, ChapterSource, DocumentError, Result};
use crate::html::text_to_html;

use super::parser::TxtParser;

impl TxtParser {
    /// Read a chapter's byte span and render it as paragraphs
    pub fn read_chapter(&self, chapter: &Chapter) -> Result<String> {
        let ChapterSource::Span {
            path,
            offset,
            length,
        } = &chapter.source
        else {
            return Err(DocumentError::Internal(format!(
                "chapter {} has no byte span",
                chapter.id
            )));
        };

        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(*offset))?;
        let mut bytes = Vec::with_capacity(*length as usize);
        file.take(*length).read_to_end(&mut bytes)?;

        Ok(text_to_html(&String::from_utf8_lossy(&bytes)))
    }
}
