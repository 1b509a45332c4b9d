//! "Updates" posts: gallery news published from the admin.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use super::artworks::slug_for;
use crate::auth::RequireAdmin;
use crate::db::updates::{Update, UpdateInput};
use crate::db::{PageParams, PaginatedResponse, UpdateRepo};
use crate::error::{Result, StoreError};
use crate::state::AppState;

/// GET /api/updates
///
/// Published posts, newest first.
pub async fn list_published(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<PaginatedResponse<Update>>> {
    let updates = UpdateRepo::list_published(&state.db, page.limit(), page.offset()).await?;
    let total = UpdateRepo::count_published(&state.db).await?;
    Ok(Json(PaginatedResponse::new(updates, total, page)))
}

/// GET /api/updates/:slug
pub async fn get_published(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<Update>> {
    let update = UpdateRepo::find_published_by_slug(&state.db, &slug)
        .await?
        .ok_or(StoreError::not_found("Update"))?;
    Ok(Json(update))
}

/// GET /api/admin/updates
pub async fn admin_list(RequireAdmin(_admin): RequireAdmin, State(state): State<AppState>) -> Result<Json<Vec<Update>>> {
    Ok(Json(UpdateRepo::list_all(&state.db).await?))
}

/// GET /api/admin/updates/:id
pub async fn admin_get(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Update>> {
    Ok(Json(UpdateRepo::find_by_id(&state.db, id).await?.ok_or(StoreError::not_found("Update"))?))
}

/// POST /api/admin/updates
///
/// A duplicate slug is rejected with 409 by the unique constraint.
pub async fn create_update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<UpdateInput>,
) -> Result<impl IntoResponse> {
    input.validate()?;
    let slug = slug_for(input.slug.as_deref(), &input.title)?;
    let update = UpdateRepo::create(&state.db, &slug, &input).await?;
    tracing::info!(update_id = %update.id, slug = %update.slug, published = update.published, admin = %admin.email, "Update created");
    Ok((StatusCode::CREATED, Json(update)))
}

/// PUT /api/admin/updates/:id
pub async fn edit_update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateInput>,
) -> Result<Json<Update>> {
    input.validate()?;
    let slug = slug_for(input.slug.as_deref(), &input.title)?;
    let update = UpdateRepo::update(&state.db, id, &slug, &input)
        .await?
        .ok_or(StoreError::not_found("Update"))?;
    Ok(Json(update))
}

/// DELETE /api/admin/updates/:id
pub async fn delete_update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !UpdateRepo::delete(&state.db, id).await? {
        return Err(StoreError::not_found("Update"));
    }
    Ok(StatusCode::NO_CONTENT)
}
