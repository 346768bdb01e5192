//! Document error types
//!
//! One error taxonomy for the whole resolution pipeline (fetch, parse,
//! cache, chapter rendering, resource access).

use std::sync::Arc;

use thiserror::Error;

/// Unified document error type
///
/// `Clone` so that a single fetch outcome can be handed to every caller
/// waiting on the same in-flight transfer.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    /// Transport failure or non-success response status
    #[error("Network error: {0}")]
    Network(String),

    /// Archive entry or resource path resolves outside its sandbox root
    #[error("Path escapes sandbox: {0}")]
    PathEscape(String),

    /// Missing pointer file, missing descriptor, malformed markup
    #[error("Corrupt document: {0}")]
    Corrupt(String),

    /// No parser registered for the extension or format name
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Chapter index outside `[0, count)`
    #[error("Chapter {index} out of range (document has {count} chapters)")]
    ChapterOutOfRange { index: usize, count: usize },

    /// Unknown fingerprint, absent cover, missing resource file
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    /// Background task failure
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

impl From<std::io::Error> for DocumentError {
    fn from(err: std::io::Error) -> Self {
        DocumentError::Io(Arc::new(err))
    }
}

impl From<zip::result::ZipError> for DocumentError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => DocumentError::from(io),
            other => DocumentError::Corrupt(format!("invalid archive: {}", other)),
        }
    }
}

impl From<quick_xml::de::DeError> for DocumentError {
    fn from(err: quick_xml::de::DeError) -> Self {
        DocumentError::Corrupt(format!("malformed markup: {}", err))
    }
}

impl From<reqwest::Error> for DocumentError {
    fn from(err: reqwest::Error) -> Self {
        DocumentError::Network(err.to_string())
    }
}

impl From<tokio::task::JoinError> for DocumentError {
    fn from(err: tokio::task::JoinError) -> Self {
        DocumentError::Internal(format!("Task join error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_is_cloneable() {
        let err = DocumentError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        let copy = err.clone();
        assert!(matches!(copy, DocumentError::Io(_)));
        assert_eq!(err.to_string(), copy.to_string());
    }

    #[test]
    fn test_out_of_range_message() {
        let err = DocumentError::ChapterOutOfRange { index: 7, count: 3 };
        assert_eq!(err.to_string(), "Chapter 7 out of range (document has 3 chapters)");
    }
}
