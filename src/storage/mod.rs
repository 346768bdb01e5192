//! Local storage for fetched documents
//!
//! Directory layout per fingerprint and the containment checks that keep
//! every archive entry and resource request inside its extraction directory.

mod layout;
pub mod sandbox;

pub use layout::{
    extension_from_locator, title_from_locator, StorageLayout, DEFAULT_EXTENSION, RAW_FILE_STEM,
};
