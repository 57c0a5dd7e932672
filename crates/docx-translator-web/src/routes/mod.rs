//! HTTP route handlers for the DOCX translator web service.
//!
//! Responses are JSON, apart from the plain-text health check.

mod translate;

pub use translate::translate_docx;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Successful translation response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    /// Base64 encoded `.docx`
    pub translated_doc: String,
    /// Suggested download name
    pub filename: String,
    /// Paragraphs found in the upload
    pub paragraphs: usize,
    /// `translated` or `bilingual`
    pub mode: &'static str,
}

/// Build the application router.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/translate", post(translate_docx))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}
