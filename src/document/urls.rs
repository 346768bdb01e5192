//! Public URLs under which a document's cover and files are served

/// Mount point of the book API
pub const API_BASE: &str = "/api/book";

/// Stable cover URL for a document
pub fn cover_url(fingerprint: &str) -> String {
    format!("{}/cover/{}", API_BASE, fingerprint)
}

/// Resource URL for a slash-separated path inside a document's extraction
/// directory; each segment is percent-encoded
pub fn resource_url(fingerprint: &str, relative_path: &str) -> String {
    let encoded: Vec<_> = relative_path
        .split('/')
        .map(urlencoding::encode)
        .collect();
    format!("{}/resource/{}/{}", API_BASE, fingerprint, encoded.join("/"))
}
