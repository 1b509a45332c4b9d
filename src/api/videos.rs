//! Video handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::RequireAdmin;
use crate::db::videos::{Video, VideoInput};
use crate::db::VideoRepo;
use crate::error::{Result, StoreError};
use crate::state::AppState;

/// GET /api/videos
///
/// Published videos ordered by position.
pub async fn list_videos(State(state): State<AppState>) -> Result<Json<Vec<Video>>> {
    Ok(Json(VideoRepo::list(&state.db, false).await?))
}

/// GET /api/admin/videos
pub async fn admin_list_videos(RequireAdmin(_admin): RequireAdmin, State(state): State<AppState>) -> Result<Json<Vec<Video>>> {
    Ok(Json(VideoRepo::list(&state.db, true).await?))
}

/// POST /api/admin/videos
pub async fn create_video(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<VideoInput>,
) -> Result<impl IntoResponse> {
    input.validate()?;
    let video = VideoRepo::create(&state.db, &input).await?;
    tracing::info!(video_id = %video.id, admin = %admin.email, "Video created");
    Ok((StatusCode::CREATED, Json(video)))
}

/// PUT /api/admin/videos/:id
pub async fn update_video(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<VideoInput>,
) -> Result<Json<Video>> {
    input.validate()?;
    let video = VideoRepo::update(&state.db, id, &input).await?.ok_or(StoreError::not_found("Video"))?;
    Ok(Json(video))
}

/// DELETE /api/admin/videos/:id
pub async fn delete_video(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !VideoRepo::delete(&state.db, id).await? {
        return Err(StoreError::not_found("Video"));
    }
    Ok(StatusCode::NO_CONTENT)
}
