//! EPUB format
//!
//! An EPUB is expanded into its extraction directory once, at parse time.
//! Chapters are the spine items, read straight from the expanded files with
//! their resource references rewritten to the resource endpoint.

mod archive;
mod package;
mod parser;
mod renderer;

pub use archive::expand;
pub use package::{descriptor_path, ManifestItem, Package, CONTAINER_PATH};
pub use parser::EpubParser;

#[cfg(test)]
pub(crate) use parser::fixtures;
