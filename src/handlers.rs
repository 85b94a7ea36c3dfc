use crate::{
    config::{CredentialsConfig, UploadConfig},
    error::Error,
    response::{UploadRequest, UploadResponse},
    storage::{Credentials, StorageBackend, UploadSource},
};
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, ContentLengthLimitRejection, QueryRejection},
        ContentLengthLimit, Query,
    },
    http::{header::CONTENT_TYPE, HeaderMap, Method},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{info, warn};

const MAX_CONTENT_LENGTH: u64 = 512 * 1024 * 1024;
const FILENAME_PREFIX: &str = "upload_";
const FILENAME_EXTENSION: &str = "bin";

#[derive(Deserialize)]
pub struct UploadParams {
    filename: Option<String>,
}

/// Accepts either `{"filename", "base64Document"}` as `application/json`, or the
/// file itself as the raw body with an optional `?filename=`.
pub async fn upload(
    method: Method,
    Extension(backend): Extension<Arc<dyn StorageBackend>>,
    Extension(config): Extension<UploadConfig>,
    headers: HeaderMap,
    query: Result<Query<UploadParams>, QueryRejection>,
    body: Result<
        ContentLengthLimit<Bytes, MAX_CONTENT_LENGTH>,
        ContentLengthLimitRejection<BytesRejection>,
    >,
) -> Result<Json<UploadResponse>, Error> {
    if method != Method::POST {
        return Err(Error::MethodNotAllowed);
    }

    let body = match body {
        Ok(ContentLengthLimit(body)) => body,
        Err(ContentLengthLimitRejection::PayloadTooLarge(_)) => {
            return Err(Error::PayloadTooLarge(MAX_CONTENT_LENGTH))
        }
        Err(ContentLengthLimitRejection::LengthRequired(_)) => return Err(Error::LengthRequired),
        Err(ContentLengthLimitRejection::Inner(err)) => {
            return Err(Error::BodyRead(err.to_string()))
        }
        Err(_) => return Err(Error::BodyRead("invalid Content-Length".to_owned())),
    };

    let (filename, payload) = if is_json(&headers) {
        extract_json(&body)?
    } else {
        let Query(params) = query.map_err(|err| Error::InvalidQuery(err.to_string()))?;
        extract_raw(params, body)?
    };

    let credentials = match &config.credentials {
        CredentialsConfig::Provided(credentials) => credentials,
        CredentialsConfig::Missing(missing) => {
            return Err(Error::MissingCredentials(missing.clone()))
        }
    };

    let file_id = store(backend.as_ref(), &config, credentials, &filename, payload).await?;
    info!("Uploaded {filename} as {file_id}");

    Ok(Json(UploadResponse::uploaded(
        format!("File uploaded successfully to {}", backend.name()),
        file_id,
    )))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map_or(false, |mime| {
            mime.trim().eq_ignore_ascii_case("application/json")
        })
}

fn extract_json(body: &[u8]) -> Result<(String, Vec<u8>), Error> {
    let request: UploadRequest = serde_json::from_slice(body)?;

    if request.filename.is_empty() || request.base64_document.is_empty() {
        return Err(Error::MissingFields);
    }

    // Line-wrapped input is common; CR and LF are not part of the alphabet.
    let encoded: String = request
        .base64_document
        .chars()
        .filter(|c| !matches!(*c, '\r' | '\n'))
        .collect();
    let payload =
        base64::decode_config(encoded, base64::STANDARD.decode_allow_trailing_bits(true))?;

    Ok((request.filename, payload))
}

fn extract_raw(params: UploadParams, body: Bytes) -> Result<(String, Vec<u8>), Error> {
    if body.is_empty() {
        return Err(Error::EmptyBody);
    }

    let filename = params
        .filename
        .filter(|name| !name.is_empty())
        .unwrap_or_else(generate_filename);

    Ok((filename, body.to_vec()))
}

fn generate_filename() -> String {
    format!(
        "{FILENAME_PREFIX}{}.{FILENAME_EXTENSION}",
        Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
    )
}

/// Opens a session, uploads, and always closes the session again. Login and
/// upload share one deadline, the close gets its own.
async fn store(
    backend: &dyn StorageBackend,
    config: &UploadConfig,
    credentials: &Credentials,
    filename: &str,
    payload: Vec<u8>,
) -> Result<String, Error> {
    let deadline = Instant::now() + config.timeout;

    let mut session = timeout_at(deadline, backend.login(credentials))
        .await
        .map_err(|_| Error::Timeout(config.timeout))?
        .map_err(Error::Authentication)?;

    let uploaded = timeout_at(
        deadline,
        session.upload(
            config.target_folder_id.as_deref(),
            filename,
            Utc::now(),
            UploadSource::from_bytes(payload),
        ),
    )
    .await;

    match timeout(config.timeout, session.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!("Failed to close {} session: {err}", backend.name()),
        Err(_) => warn!(
            "Closing {} session timed out after {:?}",
            backend.name(),
            config.timeout
        ),
    }

    match uploaded {
        Ok(result) => result.map_err(Error::Upload),
        Err(_) => Err(Error::Timeout(config.timeout)),
    }
}
