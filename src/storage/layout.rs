//! On-disk layout of fetched documents
//!
//! ```text
//! {data_dir}/{fingerprint}/raw.{ext}     fetched file
//! {data_dir}/{fingerprint}/...           expanded archive tree / converted text
//! ```

use std::path::{Path, PathBuf};

use reqwest::Url;

/// Base name of the fetched file inside its extraction directory
pub const RAW_FILE_STEM: &str = "raw";

/// Extension used when none can be inferred from the locator
pub const DEFAULT_EXTENSION: &str = "bin";

/// Maps fingerprints to directories under the data root
#[derive(Debug, Clone)]
pub struct StorageLayout {
    data_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `{data_dir}/{fingerprint}`
    pub fn extraction_dir(&self, fingerprint: &str) -> PathBuf {
        self.data_dir.join(fingerprint)
    }

    /// `{data_dir}/{fingerprint}/raw.{ext}` with `ext` taken from the locator
    pub fn raw_file(&self, fingerprint: &str, locator: &str) -> PathBuf {
        self.extraction_dir(fingerprint)
            .join(format!("{}.{}", RAW_FILE_STEM, extension_from_locator(locator)))
    }
}

/// Path component of a locator, with query string and fragment removed
fn locator_path(locator: &str) -> String {
    match Url::parse(locator) {
        Ok(url) => url.path().to_string(),
        Err(_) => locator
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Infer the file extension of a locator, falling back to [`DEFAULT_EXTENSION`]
pub fn extension_from_locator(locator: &str) -> String {
    let path = locator_path(locator);
    Path::new(&path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Percent-decoded file stem of a locator, used as a fallback title
pub fn title_from_locator(locator: &str) -> Option<String> {
    let path = locator_path(locator);
    let stem = Path::new(&path).file_stem()?.to_str()?;
    let decoded = urlencoding::decode(stem)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| stem.to_string());
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
