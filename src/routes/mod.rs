//! Route modules for Folio Server
//!
//! ```text
//! GET /api/book/meta?file={locator}                 Document JSON
//! GET /api/book/chapter/{index}?file={locator}      {"content": html}
//! GET /api/book/cover/{fingerprint}                 cover image
//! GET /api/book/resource/{fingerprint}/{path..}     file from the extraction directory
//! GET /health
//! ```

pub mod books;
pub mod health;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::document::API_BASE;
use crate::state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/health", health::router())
        .nest(API_BASE, books::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
