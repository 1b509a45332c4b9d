//! General inquiries, preorders and commission requests.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::RequireAdmin;
use crate::db::inquiries::{Inquiry, InquiryFilter, InquiryInput};
use crate::db::{ArtworkRepo, InquiryRepo, PageParams, PaginatedResponse};
use crate::domain::aggregates::{InquiryKind, InquiryStatus};
use crate::domain::events::{DomainEvent, InquiryEvent};
use crate::error::{Result, StoreError};
use crate::services::email;
use crate::state::AppState;

/// POST /api/inquiries
///
/// Preorders must name an existing artwork. The gallery inbox is notified.
pub async fn create_inquiry(State(state): State<AppState>, Json(input): Json<InquiryInput>) -> Result<impl IntoResponse> {
    input.validate()?;
    if input.kind.requires_artwork() && input.artwork_id.is_none() {
        return Err(StoreError::Validation("A preorder must reference an artwork".into()));
    }
    let artwork = match input.artwork_id {
        Some(id) => Some(ArtworkRepo::find_by_id(&state.db, id).await?.ok_or(StoreError::not_found("Artwork"))?),
        None => None,
    };

    let inquiry = InquiryRepo::create(&state.db, &input).await?;
    tracing::info!(inquiry_id = %inquiry.id, kind = %input.kind, artwork_id = ?input.artwork_id, "Inquiry received");

    state
        .events
        .publish(&DomainEvent::Inquiry(InquiryEvent::Received {
            inquiry_id: inquiry.id,
            kind: inquiry.kind.clone(),
            artwork_id: inquiry.artwork_id,
        }))
        .await;

    if let Some(inbox) = state.mailer.gallery_inbox() {
        let notification = email::inquiry_received(
            inbox,
            input.kind.as_str(),
            &inquiry.name,
            &inquiry.email,
            &inquiry.message,
            artwork.as_ref().map(|a| a.title.as_str()),
        );
        state.mailer.send_or_log(notification).await;
    }

    Ok((StatusCode::CREATED, Json(inquiry)))
}

#[derive(Debug, Default, Deserialize)]
pub struct InquiryListQuery {
    pub status: Option<InquiryStatus>,
    pub kind: Option<InquiryKind>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/admin/inquiries
pub async fn list_inquiries(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<InquiryListQuery>,
) -> Result<Json<PaginatedResponse<Inquiry>>> {
    let page = PageParams { page: query.page, per_page: query.per_page };
    let filter = InquiryFilter { status: query.status, kind: query.kind };
    let inquiries = InquiryRepo::list(&state.db, &filter, page.limit(), page.offset()).await?;
    let total = InquiryRepo::count(&state.db, &filter).await?;
    Ok(Json(PaginatedResponse::new(inquiries, total, page)))
}

#[derive(Debug, Deserialize)]
pub struct InquiryStatusChange {
    pub status: InquiryStatus,
}

/// PATCH /api/admin/inquiries/:id/status
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<InquiryStatusChange>,
) -> Result<Json<Inquiry>> {
    let inquiry = InquiryRepo::set_status(&state.db, id, input.status)
        .await?
        .ok_or(StoreError::not_found("Inquiry"))?;
    tracing::info!(inquiry_id = %id, status = %input.status, admin = %admin.email, "Inquiry status changed");
    Ok(Json(inquiry))
}
