//! Document resolution
//!
//! Composes fetching, parsing and caching behind [`ResolutionService`].

mod service;

pub use service::ResolutionService;
