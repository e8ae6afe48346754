//! File HTTP Routes
//!
//! - `POST /files` - upload multipart field `f`
//! - `GET /files/:hash` - download raw bytes (conditional and range aware)
//! - `DELETE /files/:hash` - remove a file

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, error};

use super::conditional::{etag_matches, parse_range, RangeRequest};
use super::errors::ApiError;
use crate::file_storage::{content_type_for, FileMetadata, FileService, StorageResult};

/// Multipart field carrying the uploaded file
pub const UPLOAD_FIELD: &str = "f";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

// ==================
// Shared State
// ==================

/// File state shared across handlers
pub struct FileState {
    pub service: FileService,
}

impl FileState {
    pub fn new(service: FileService) -> Self {
        Self { service }
    }
}

// ==================
// File Routes
// ==================

/// Create file routes
pub fn file_routes(state: Arc<FileState>) -> Router {
    Router::new()
        .route("/files", post(upload_file_handler))
        .route("/files/", get(missing_hash_handler).delete(missing_hash_handler))
        .route(
            "/files/:hash",
            get(download_file_handler).delete(delete_file_handler),
        )
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

/// Run a blocking storage call on the blocking pool.
async fn run_blocking<T, F>(op: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            let kind = if e.is_panic() { "panic" } else { "cancelled" };
            error!(op, kind, error = %e, "storage task did not complete");
            Err(ApiError::Internal("internal server error".to_string()))
        }
    }
}

/// Pick a content type: the file extension wins, then the part's declared type.
fn resolve_content_type(file_name: &str, declared: Option<&str>) -> String {
    content_type_for(file_name)
        .or(declared)
        .unwrap_or_default()
        .to_string()
}

// ==================
// File Handlers
// ==================

async fn upload_file_handler(
    State(state): State<Arc<FileState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FileMetadata>, ApiError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(ApiError::BadRequest(format!(
                    "Multipart field '{}' must be a file",
                    UPLOAD_FIELD
                )))
            }
        };
        let content_type = resolve_content_type(&file_name, field.content_type());
        let data = field.bytes().await?.to_vec();

        let service = state.service.clone();
        let metadata = run_blocking("add", move || {
            service.add_file(&file_name, &content_type, data)
        })
        .await?;

        return Ok(Json(metadata));
    }

    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}

async fn download_file_handler(
    State(state): State<Arc<FileState>>,
    Path(hash): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if hash.is_empty() {
        return Err(ApiError::BadRequest("Hash is required".to_string()));
    }

    let service = state.service.clone();
    let record = run_blocking("get", move || service.get_file(&hash)).await?;

    let etag_value = format!("\"{}\"", record.metadata.hash);
    let etag = HeaderValue::from_str(&etag_value).map_err(|e| {
        error!(hash = %record.metadata.hash, error = %e, "could not build etag header");
        ApiError::Internal("internal server error".to_string())
    })?;

    if header_str(&headers, header::IF_NONE_MATCH).is_some_and(|v| etag_matches(v, &etag_value)) {
        debug!(hash = %record.metadata.hash, "etag match, not modified");
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    let content_type = match record.metadata.content_type.as_str() {
        "" => FALLBACK_CONTENT_TYPE,
        declared => declared,
    };
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    let accept_ranges = HeaderValue::from_static("bytes");

    // A stale If-Range validator means the client gets the whole body.
    let range_applies = header_str(&headers, header::IF_RANGE).map_or(true, |v| v.trim() == etag_value);
    let range = match header_str(&headers, header::RANGE) {
        Some(value) if range_applies => parse_range(value, record.data.len() as u64),
        _ => RangeRequest::Full,
    };

    let total = record.data.len();
    match range {
        RangeRequest::Full => Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (header::ETAG, etag),
                (header::ACCEPT_RANGES, accept_ranges),
            ],
            record.data,
        )
            .into_response()),
        RangeRequest::Partial { start, end } => {
            // Both bounds are clamped to the payload length by parse_range.
            let (start, end) = (start as usize, end as usize);
            let content_range = HeaderValue::from_str(&format!("bytes {}-{}/{}", start, end - 1, total))
                .map_err(|e| {
                    error!(error = %e, "could not build content-range header");
                    ApiError::Internal("internal server error".to_string())
                })?;
            debug!(hash = %record.metadata.hash, start, end, "serving partial content");

            let mut data = record.data;
            data.truncate(end);
            data.drain(..start);

            Ok((
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::ETAG, etag),
                    (header::ACCEPT_RANGES, accept_ranges),
                    (header::CONTENT_RANGE, content_range),
                ],
                data,
            )
                .into_response())
        }
        RangeRequest::Unsatisfiable => {
            let content_range = HeaderValue::from_str(&format!("bytes */{}", total)).map_err(|e| {
                error!(error = %e, "could not build content-range header");
                ApiError::Internal("internal server error".to_string())
            })?;
            Ok((
                StatusCode::RANGE_NOT_SATISFIABLE,
                [(header::CONTENT_RANGE, content_range), (header::ACCEPT_RANGES, accept_ranges)],
            )
                .into_response())
        }
    }
}

/// Header value as text, if present and visible ASCII.
fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn delete_file_handler(
    State(state): State<Arc<FileState>>,
    Path(hash): Path<String>,
) -> Result<StatusCode, ApiError> {
    if hash.is_empty() {
        return Err(ApiError::BadRequest("Hash is required".to_string()));
    }

    let service = state.service.clone();
    run_blocking("delete", move || service.delete_file(&hash)).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn missing_hash_handler() -> ApiError {
    ApiError::BadRequest("Hash is required".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_content_type() {
        assert_eq!(resolve_content_type("hello.txt", Some("application/x-custom")), "text/plain");
        assert_eq!(resolve_content_type("blob", Some("application/x-custom")), "application/x-custom");
        assert_eq!(resolve_content_type("blob", None), "");
    }
}
