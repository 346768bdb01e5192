//! EPUB parsing: expand the archive, then read container → package → spine

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use crate::document::{Chapter, ChapterSource, Document, DocumentError, DocumentFormat, Result};
use crate::storage::sandbox;

use super::archive;
use super::package::{self, Package, CONTAINER_PATH};

/// Zip-packaged document parser
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubParser;

impl EpubParser {
    pub fn new() -> Self {
        Self
    }

    /// Expand `raw_path` into `extraction_dir` and build the chapter list
    ///
    /// Title and author are left empty when the package has none.
    pub fn parse(&self, raw_path: &Path, extraction_dir: &Path) -> Result<Document> {
        let root = sandbox::normalize(extraction_dir);
        let entries = archive::expand(raw_path, &root)?;
        tracing::debug!(entries, dir = %root.display(), "Expanded EPUB archive");

        let container_xml = read_markup(&root.join(CONTAINER_PATH))
            .map_err(|_| DocumentError::Corrupt(format!("missing {}", CONTAINER_PATH)))?;
        let descriptor = package::descriptor_path(&container_xml)?;

        let opf_path = sandbox::contain(&root, &*decode_href(&descriptor))?;
        let opf_xml = read_markup(&opf_path).map_err(|_| {
            DocumentError::Corrupt(format!("missing package descriptor {}", descriptor))
        })?;
        let package = Package::parse(&opf_xml)?;
        let opf_dir = opf_path.parent().unwrap_or(root.as_path());

        let mut chapters = Vec::with_capacity(package.spine.len());
        for idref in &package.spine {
            let Some(item) = package.item(idref) else {
                tracing::debug!(idref = %idref, "Spine references unknown manifest item, skipping");
                continue;
            };
            let path = sandbox::ensure_within(&root, &opf_dir.join(&*decode_href(&item.href)))?;
            let index = chapters.len();
            chapters.push(Chapter {
                id: index,
                title: format!("Chapter {}", index + 1),
                source: ChapterSource::File { path },
            });
        }

        let cover_path = match package.cover_item() {
            Some(item) => Some(sandbox::ensure_within(
                &root,
                &opf_dir.join(&*decode_href(&item.href)),
            )?),
            None => find_cover_file(&root),
        };

        Ok(Document {
            id: String::new(),
            title: package.title.unwrap_or_default(),
            author: package.author.unwrap_or_default(),
            format: DocumentFormat::Epub,
            cover_url: None,
            chapters,
            extraction_dir: root,
            cover_path,
        })
    }
}

/// Image extensions accepted for a cover found by file name
const COVER_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// First image file (depth-first, sorted by name) whose name mentions "cover"
fn find_cover_file(dir: &Path) -> Option<std::path::PathBuf> {
    let mut entries: Vec<_> = fs::read_dir(dir).ok()?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if let Some(found) = find_cover_file(&path) {
                return Some(found);
            }
        } else if file_type.is_file() && is_cover_image_name(&path) {
            return Some(path);
        }
    }
    None
}

fn is_cover_image_name(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.contains("cover") && COVER_EXTENSIONS.contains(&ext.as_str())
}

/// Read an XML file, tolerating stray invalid UTF-8
fn read_markup(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Manifest hrefs are URLs: `%20` names a file with a space
pub(crate) fn decode_href(href: &str) -> Cow<'_, str> {
    urlencoding::decode(href).unwrap_or(Cow::Borrowed(href))
}
