//! Admin media uploads to the artworks bucket.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::auth::RequireAdmin;
use crate::error::{Result, StoreError};
use crate::services::storage::sanitize_segment;
use crate::state::AppState;

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

/// POST /api/admin/uploads/:folder
///
/// Raw image body; the `Content-Type` header selects the file extension.
/// Returns the stored object's public URL.
pub async fn upload_image(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(folder): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
        .unwrap_or_default();
    let extension = extension_for(&content_type)
        .ok_or_else(|| StoreError::Validation(format!("Unsupported content type '{content_type}'")))?;
    if body.is_empty() {
        return Err(StoreError::Validation("Upload body is empty".into()));
    }
    let folder = sanitize_segment(&folder);
    if folder.is_empty() {
        return Err(StoreError::Validation("Invalid upload folder".into()));
    }

    let path = format!("{folder}/{}.{extension}", Uuid::now_v7());
    let stored = state
        .storage
        .upload(&state.config.supabase.artwork_bucket, &path, body.to_vec(), &content_type)
        .await?;

    tracing::info!(path = %stored.path, admin = %admin.email, "Image uploaded");
    Ok((StatusCode::CREATED, Json(stored)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_images_are_accepted() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("application/pdf"), None);
    }
}
