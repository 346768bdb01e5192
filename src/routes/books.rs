//! Book API endpoints
//!
//! Provides the reader API for remote documents:
//! - Resolve a locator to document metadata
//! - Get chapter content as HTML
//! - Get the cover image
//! - Get resources (images, CSS, fonts) referenced by chapters

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::document::{Document, Resource};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// `?file=` query naming the source locator
#[derive(Debug, Deserialize)]
pub struct LocatorQuery {
    pub file: Option<String>,
}

impl LocatorQuery {
    fn locator(&self) -> Result<&str> {
        self.file
            .as_deref()
            .map(str::trim)
            .filter(|file| !file.is_empty())
            .ok_or_else(|| AppError::BadRequest("missing file parameter".to_string()))
    }
}

/// Chapter content response
#[derive(Debug, Serialize)]
pub struct ChapterResponse {
    pub content: String,
}

/// Create the books router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/meta", get(get_meta))
        .route("/chapter/:index", get(get_chapter))
        .route("/cover/:fingerprint", get(get_cover))
        .route("/resource/:fingerprint/*path", get(get_resource))
}

/// Resolve a locator and return its metadata
async fn get_meta(
    State(state): State<AppState>,
    Query(query): Query<LocatorQuery>,
) -> Result<Json<Document>> {
    let document = state.service().resolve(query.locator()?).await?;
    Ok(Json(Document::clone(&document)))
}

/// Render one chapter of a locator's document
async fn get_chapter(
    State(state): State<AppState>,
    Path(index): Path<String>,
    Query(query): Query<LocatorQuery>,
) -> Result<Json<ChapterResponse>> {
    let index: usize = index
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid chapter index: {}", index)))?;
    let locator = query.locator()?;

    let document = state.service().resolve(locator).await?;
    let content = state.service().chapter(document, index).await?;
    Ok(Json(ChapterResponse { content }))
}

async fn get_cover(
    State(state): State<AppState>,
    Path(fingerprint): Path<String>,
) -> Result<Response> {
    let resource = state.service().cover(&fingerprint).await?;
    resource_response(resource)
}

async fn get_resource(
    State(state): State<AppState>,
    Path((fingerprint, path)): Path<(String, String)>,
) -> Result<Response> {
    let resource = state.service().resource(&fingerprint, &path).await?;
    resource_response(resource)
}

fn resource_response(resource: Resource) -> Result<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, resource.media_type)
        .header(header::CACHE_CONTROL, "max-age=3600")
        .body(Body::from(resource.data))
        .map_err(|e| AppError::Internal(format!("failed to build response: {}", e)))
}
