//! Image upload handler.
//!
//! Accepts a multipart form with a `file` field, stores the image under
//! the configured upload directory, and returns the public URL clients
//! pass back as a pet's portrait.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Supported image file extensions for upload.
const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_url: String,
}

/// POST /api/v1/uploads
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut file_data: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload.png").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            file_data = Some((filename, data.to_vec()));
        }
    }

    let (filename, data) =
        file_data.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    if !ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unsupported file type '.{ext}'. Supported: .png, .jpg, .jpeg, .gif"
        )));
    }

    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    // Unique prefix avoids collisions between same-named uploads.
    let prefix = uuid::Uuid::new_v4().simple().to_string();
    let stored_filename = format!("{}_{}", &prefix[..8], sanitize_filename(&filename));
    let file_path = state.config.upload_dir.join(&stored_filename);

    tokio::fs::write(&file_path, &data)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let file_url = format!("{}/uploads/{stored_filename}", state.config.public_base_url);
    tracing::info!(path = %file_path.display(), size = data.len(), "File uploaded");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UploadResponse { file_url },
        }),
    ))
}

/// Keep only filesystem-safe filename characters.
fn sanitize_filename(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    // Guard against dot-only names hiding the file or escaping upward.
    safe.trim_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_names() {
        assert_eq!(sanitize_filename("pet_photo-1.png"), "pet_photo-1.png");
    }

    #[test]
    fn sanitize_replaces_path_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
    }

    #[test]
    fn sanitize_replaces_unicode() {
        assert_eq!(sanitize_filename("宠物.png"), "__.png");
    }
}
