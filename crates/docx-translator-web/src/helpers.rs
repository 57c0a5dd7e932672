//! Helper types and traits for cleaner route handlers.
//!
//! Every failure leaves the API as a 500 with a JSON body, so handlers only
//! need to say what went wrong.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docx_translator_core::Error as CoreError;
use serde::Serialize;

/// Standard result type for route handlers.
pub type RouteResult<T> = Result<T, ApiError>;

/// An error reported to the API caller.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The multipart body could not be read or had no usable file
    #[error("Upload failed: {0}")]
    Upload(String),

    /// The pipeline failed
    #[error(transparent)]
    Translation(#[from] CoreError),
}

impl ApiError {
    /// Machine-readable category, next to the human-readable message
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upload(_) => "upload_failure",
            Self::Translation(e) => e.kind().as_str(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed ({}): {}", self.kind(), self);
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Extension trait for converting `Result<T, E>` to `RouteResult<T>`.
pub trait ResultExt<T, E: std::fmt::Display> {
    /// Reports the error as an upload failure.
    fn or_upload_error(self) -> RouteResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn or_upload_error(self) -> RouteResult<T> {
        self.map_err(|e| ApiError::Upload(e.to_string()))
    }
}
