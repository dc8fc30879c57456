use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Single service-boundary error kind. Lower-level I/O and decode failures
/// are wrapped here with a human-readable message and never escape raw.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("invalid file type: {0}")]
    InvalidExtension(String),
    #[error("failed to store file: {0}")]
    Write(String),
    #[error("failed to compress image: {0}")]
    Compress(String),
    #[error("failed to list uploads: {0}")]
    List(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) | ApiError::Storage(StorageError::InvalidExtension(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
