//! Resource URL rewriting for archive chapters
//!
//! Relative `src`, `href` and `xlink:href` references are resolved against the
//! chapter's directory and pointed at the resource endpoint. Matching works on
//! the raw markup, attribute by attribute, so everything outside a rewritten
//! value is left exactly as written.

use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::document::resource_url;
use crate::storage::sandbox;

/// A reference attribute with its value: leading whitespace, name, `=`, and a
/// double- or single-quoted value
static REFERENCE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\s)((?:xlink:)?(?:src|href))(\s*=\s*)(?:"([^"]*)"|'([^']*)')"#)
        .expect("reference attribute pattern is valid")
});

/// Extensions of hyperlinked documents, which stay as in-book links
const DOCUMENT_EXTENSIONS: [&str; 3] = ["xhtml", "html", "htm"];

/// Where a chapter lives, for resolving its relative references
#[derive(Debug, Clone, Copy)]
pub struct ChapterBase<'a> {
    /// Extraction directory of the document
    pub root: &'a Path,
    /// Directory containing the chapter file
    pub chapter_dir: &'a Path,
    pub fingerprint: &'a str,
}

/// Rewrite relative resource references in chapter markup
pub fn rewrite_resource_urls(html: &str, base: &ChapterBase<'_>) -> String {
    REFERENCE_ATTRIBUTE
        .replace_all(html, |caps: &Captures<'_>| {
            let (value, quote) = match caps.get(4) {
                Some(value) => (value.as_str(), '"'),
                None => (caps.get(5).map_or("", |value| value.as_str()), '\''),
            };
            match resolve_reference(&caps[2], value, base) {
                Some(url) => format!("{}{}{}{quote}{url}{quote}", &caps[1], &caps[2], &caps[3]),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Resource URL for a reference, or `None` when it must stay unchanged
pub fn resolve_reference(attr: &str, value: &str, base: &ChapterBase<'_>) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.starts_with('#') || value.starts_with("//") || has_scheme(value) {
        return None;
    }

    let split = value.find(['?', '#']).unwrap_or(value.len());
    let (path, suffix) = value.split_at(split);
    if path.is_empty() {
        return None;
    }
    if attr.eq_ignore_ascii_case("href") && is_document_link(path) {
        return None;
    }

    let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
    let target = sandbox::ensure_within(base.root, &base.chapter_dir.join(&*decoded)).ok()?;
    let relative = sandbox::relative_slash_path(base.root, &target)?;

    Some(format!("{}{}", resource_url(base.fingerprint, &relative), suffix))
}

/// `scheme:` per RFC 3986: a letter, then letters, digits, `+`, `-` or `.`
fn has_scheme(value: &str) -> bool {
    let Some(colon) = value.find(':') else {
        return false;
    };
    let scheme = &value[..colon];
    scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn is_document_link(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((_, ext)) => DOCUMENT_EXTENSIONS
            .iter()
            .any(|doc| ext.eq_ignore_ascii_case(doc)),
        None => true,
    }
}
