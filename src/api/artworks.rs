//! Catalogue handlers: artworks and their priced variants.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::RequireAdmin;
use crate::db::artworks::{Artwork, ArtworkFilter, ArtworkInput};
use crate::db::variants::{ArtworkVariant, VariantInput};
use crate::db::{ArtworkRepo, PageParams, PaginatedResponse, VariantRepo};
use crate::domain::aggregates::{ArtworkStatus, Scale};
use crate::domain::value_objects::Slug;
use crate::error::{Result, StoreError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ArtworkListQuery {
    pub status: Option<ArtworkStatus>,
    pub scale: Option<Scale>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ArtworkListQuery {
    fn split(self) -> (ArtworkFilter, PageParams) {
        let filter = ArtworkFilter {
            status: self.status,
            scale: self.scale,
            featured: self.featured,
            search: self.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        };
        (filter, PageParams { page: self.page, per_page: self.per_page })
    }
}

#[derive(Debug, Serialize)]
pub struct ArtworkDetail {
    #[serde(flatten)]
    pub artwork: Artwork,
    pub variants: Vec<ArtworkVariant>,
}

pub(crate) fn slug_for(explicit: Option<&str>, title: &str) -> Result<String> {
    Slug::new(explicit.unwrap_or(title))
        .map(Slug::into_inner)
        .map_err(|e| StoreError::Validation(format!("Invalid slug: {e}")))
}

async fn paginate(state: &AppState, query: ArtworkListQuery) -> Result<PaginatedResponse<Artwork>> {
    let (filter, page) = query.split();
    let artworks = ArtworkRepo::list(&state.db, &filter, page.limit(), page.offset()).await?;
    let total = ArtworkRepo::count(&state.db, &filter).await?;
    Ok(PaginatedResponse::new(artworks, total, page))
}

/// GET /api/artworks
pub async fn list_artworks(
    State(state): State<AppState>,
    Query(query): Query<ArtworkListQuery>,
) -> Result<Json<PaginatedResponse<Artwork>>> {
    Ok(Json(paginate(&state, query).await?))
}

/// GET /api/artworks/:id
///
/// Accepts either the artwork id or its slug. Only active variants are included.
pub async fn get_artwork(State(state): State<AppState>, Path(key): Path<String>) -> Result<Json<ArtworkDetail>> {
    let artwork = match Uuid::parse_str(&key) {
        Ok(id) => ArtworkRepo::find_by_id(&state.db, id).await?,
        Err(_) => ArtworkRepo::find_by_slug(&state.db, &key).await?,
    }
    .ok_or(StoreError::not_found("Artwork"))?;

    let variants = VariantRepo::list_for_artwork(&state.db, artwork.id, false).await?;
    Ok(Json(ArtworkDetail { artwork, variants }))
}

/// GET /api/artworks/:id/variants
pub async fn list_variants(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Vec<ArtworkVariant>>> {
    Ok(Json(VariantRepo::list_for_artwork(&state.db, id, false).await?))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// GET /api/admin/artworks
pub async fn admin_list_artworks(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ArtworkListQuery>,
) -> Result<Json<PaginatedResponse<Artwork>>> {
    Ok(Json(paginate(&state, query).await?))
}

/// POST /api/admin/artworks
pub async fn create_artwork(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<ArtworkInput>,
) -> Result<impl IntoResponse> {
    input.validate()?;
    let slug = slug_for(input.slug.as_deref(), &input.title)?;
    let artwork = ArtworkRepo::create(&state.db, &slug, &input).await?;

    tracing::info!(artwork_id = %artwork.id, slug = %artwork.slug, admin = %admin.email, "Artwork created");
    Ok((StatusCode::CREATED, Json(artwork)))
}

/// PUT /api/admin/artworks/:id
pub async fn update_artwork(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ArtworkInput>,
) -> Result<Json<Artwork>> {
    input.validate()?;
    let slug = slug_for(input.slug.as_deref(), &input.title)?;
    let artwork = ArtworkRepo::update(&state.db, id, &slug, &input)
        .await?
        .ok_or(StoreError::not_found("Artwork"))?;

    tracing::info!(artwork_id = %id, admin = %admin.email, "Artwork updated");
    Ok(Json(artwork))
}

/// DELETE /api/admin/artworks/:id
///
/// Artworks that appear on an order cannot be deleted (409).
pub async fn delete_artwork(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !ArtworkRepo::delete(&state.db, id).await? {
        return Err(StoreError::not_found("Artwork"));
    }
    tracing::info!(artwork_id = %id, admin = %admin.email, "Artwork deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/artworks/:id/variants
pub async fn admin_list_variants(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ArtworkVariant>>> {
    Ok(Json(VariantRepo::list_for_artwork(&state.db, id, true).await?))
}

/// POST /api/admin/artworks/:id/variants
pub async fn create_variant(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(artwork_id): Path<Uuid>,
    Json(input): Json<VariantInput>,
) -> Result<impl IntoResponse> {
    input.validate()?;
    ArtworkRepo::find_by_id(&state.db, artwork_id).await?.ok_or(StoreError::not_found("Artwork"))?;
    let variant = VariantRepo::create(&state.db, artwork_id, &input).await?;

    tracing::info!(artwork_id = %artwork_id, variant_id = %variant.id, admin = %admin.email, "Variant created");
    Ok((StatusCode::CREATED, Json(variant)))
}

/// PUT /api/admin/variants/:id
pub async fn update_variant(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<VariantInput>,
) -> Result<Json<ArtworkVariant>> {
    input.validate()?;
    let variant = VariantRepo::update(&state.db, id, &input).await?.ok_or(StoreError::not_found("Variant"))?;
    Ok(Json(variant))
}

/// DELETE /api/admin/variants/:id
pub async fn delete_variant(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !VariantRepo::delete(&state.db, id).await? {
        return Err(StoreError::not_found("Variant"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_falls_back_to_title() {
        assert_eq!(slug_for(None, "Still Water, No. 3").unwrap(), "still-water-no-3");
        assert_eq!(slug_for(Some("custom-slug"), "ignored").unwrap(), "custom-slug");
        assert!(matches!(slug_for(None, "!!!"), Err(StoreError::Validation(_))));
    }

    #[test]
    fn search_is_trimmed_and_blank_dropped() {
        let query = ArtworkListQuery { search: Some("   ".into()), page: Some(2), ..Default::default() };
        let (filter, page) = query.split();
        assert_eq!(filter.search, None);
        assert_eq!(page.offset(), 20);
    }
}
