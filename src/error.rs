use crate::{response::UploadResponse, storage::StorageError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Duration;
use thiserror::Error;
use tracing::error;

const MAX_BACKEND_MESSAGE_LEN: usize = 512;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Failed to read request body: {0}")]
    BodyRead(String),
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
    #[error("Invalid request payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("Filename and base64Document are required")]
    MissingFields,
    #[error("Invalid base64 document: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("Request body is empty")]
    EmptyBody,
    #[error("Content-Length header is required")]
    LengthRequired,
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(u64),
    #[error("Storage credentials not configured ({0})")]
    MissingCredentials(String),
    #[error("Storage authentication failed: {}", truncate(.0))]
    Authentication(StorageError),
    #[error("Storage upload failed: {}", truncate(.0))]
    Upload(StorageError),
    #[error("Storage request timed out after {:?}", .0)]
    Timeout(Duration),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Error::BodyRead(_)
            | Error::InvalidQuery(_)
            | Error::InvalidPayload(_)
            | Error::MissingFields
            | Error::InvalidBase64(_)
            | Error::EmptyBody => StatusCode::BAD_REQUEST,
            Error::LengthRequired => StatusCode::LENGTH_REQUIRED,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::MissingCredentials(_)
            | Error::Authentication(_)
            | Error::Upload(_)
            | Error::Timeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let message = self.to_string();

        error!("Error: {} - {message}", code.as_u16());

        (code, Json(UploadResponse::failure(message))).into_response()
    }
}

/// Caps backend diagnostics before they are echoed to callers.
fn truncate(err: &StorageError) -> String {
    let message = err.0.as_str();
    match message.char_indices().nth(MAX_BACKEND_MESSAGE_LEN) {
        Some((end, _)) => format!("{}...", &message[..end]),
        None => message.to_owned(),
    }
}
