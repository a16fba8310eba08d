//! `POST /upload`: store a file and return its URL with a QR code.

use axum::{
    Json, Router,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    routing::post,
};
use qrshare_core::upload::{UploadError, UploadRequest};
use qrshare_shared::types::UploadResult;
use tracing::debug;

use crate::AppState;
use crate::error::ApiError;

/// Name of the multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

/// File name used when the client sends none.
const FALLBACK_FILE_NAME: &str = "file";

/// Creates the upload routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload))
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResult>, ApiError> {
    let multipart = multipart.map_err(|rejection| {
        debug!(error = %rejection, "upload without a multipart body");
        UploadError::MissingFile
    })?;

    let request = read_file_field(multipart).await?;
    let result = state.uploads.process(request).await?;
    Ok(Json(result))
}

/// Extract the single `file` field. Other fields are ignored.
async fn read_file_field(mut multipart: Multipart) -> Result<UploadRequest, UploadError> {
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if file.is_some() {
            return Err(UploadError::MultipleFiles);
        }

        let file_name = field
            .file_name()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_FILE_NAME)
            .to_string();
        let content_type = field.content_type().map(str::to_string);
        let payload = field.bytes().await.map_err(multipart_error)?;

        file = Some(UploadRequest::new(file_name, content_type, payload));
    }

    file.ok_or(UploadError::MissingFile)
}

fn multipart_error(err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::BodyTooLarge(err.body_text())
    } else {
        UploadError::Malformed(err.body_text())
    }
}
