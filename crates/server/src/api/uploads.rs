//! Image upload handler.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::ErrorResponse;
use crate::state::AppState;

/// Response for a stored upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    /// Name the file was stored under (pass this to the generate endpoint).
    pub filename: String,
    /// Full storage path.
    pub file_path: String,
    /// Name the client sent.
    pub original_filename: String,
    /// Size in bytes.
    pub size: usize,
}

/// Accept a multipart image upload and store it under a unique name.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<ErrorResponse>)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!("Invalid multipart body: {}", e))),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let original_filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or("").to_string();
        if !content_type.starts_with("image/") {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("File must be an image")),
            ));
        }

        let bytes = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!("Could not read upload: {}", e))),
            )
        })?;

        let max_bytes = state.config().server.max_upload_bytes;
        if bytes.len() > max_bytes {
            return Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorResponse::new(format!(
                    "Upload exceeds the {} byte limit",
                    max_bytes
                ))),
            ));
        }

        let extension = Path::new(&original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_else(|| ".png".to_string());
        let filename = format!("{}{}", Uuid::new_v4().simple(), extension);

        let uploads_dir = &state.config().storage.uploads_dir;
        let file_path = uploads_dir.join(&filename);

        tokio::fs::create_dir_all(uploads_dir).await.map_err(|e| {
            warn!(error = %e, "Could not create uploads directory");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
        })?;
        tokio::fs::write(&file_path, &bytes).await.map_err(|e| {
            warn!(error = %e, path = %file_path.display(), "Could not store upload");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
        })?;

        info!(
            filename = %filename,
            original = %original_filename,
            bytes = bytes.len(),
            "Image uploaded"
        );

        return Ok(Json(UploadResponse {
            success: true,
            filename,
            file_path: file_path.to_string_lossy().into_owned(),
            original_filename,
            size: bytes.len(),
        }));
    }

    Err((
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("Missing 'file' field")),
    ))
}
