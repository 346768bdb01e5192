//! HTML processing module
//!
//! Provides the markup produced for chapters:
//! - Resource URL rewriting for archive chapters
//! - Paragraph rendering for plain text chapters

mod paragraphs;
mod rewriter;

pub use paragraphs::{text_to_html, TEXT_CHAPTER_CLASS};
pub use rewriter::{resolve_reference, rewrite_resource_urls, ChapterBase};
