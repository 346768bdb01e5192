//! Folio Server Library
//!
//! Resolves remote ebooks (EPUB, plain text) into cached, chapterized
//! documents and serves their chapters and resources over HTTP.
//! The server binary is in main.rs.
//!
//! # Modules
//!
//! - `fetch`: Fingerprinting and deduplicated downloads
//! - `document`: Document model, errors and the metadata cache
//! - `formats`: Format parsers (EPUB, TXT)
//! - `html`: Chapter markup processing
//! - `library`: The resolution service tying the pipeline together
//! - `routes`: HTTP API

pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod formats;
pub mod html;
pub mod library;
pub mod routes;
pub mod state;
pub mod storage;
