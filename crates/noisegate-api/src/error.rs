use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::archive::ArchiveError;
use noisegate_db::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No files uploaded.")]
    EmptyUpload,

    #[error("No PNG files in upload.")]
    NoQualifyingFiles,

    #[error("Failed to read image {0}")]
    BadImage(String),

    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::EmptyUpload
            | ApiError::NoQualifyingFiles
            | ApiError::BadImage(_)
            | ApiError::Multipart(_)
            | ApiError::Archive(ArchiveError::EmptyInput) => StatusCode::BAD_REQUEST,
            ApiError::Archive(_) | ApiError::Store(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
            return (status, "internal error").into_response();
        }
        (status, self.to_string()).into_response()
    }
}
