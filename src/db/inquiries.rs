//! Repository for the `inquiries` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{InquiryKind, InquiryStatus};

const COLUMNS: &str = "\
    id, kind, name, email, phone, message, artwork_id, variant_id, quantity, status, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Inquiry {
    pub id: Uuid,
    pub kind: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub artwork_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InquiryInput {
    #[serde(default = "default_kind")]
    pub kind: InquiryKind,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
    pub artwork_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    #[validate(range(min = 1, max = 100))]
    pub quantity: Option<i32>,
}

fn default_kind() -> InquiryKind {
    InquiryKind::General
}

#[derive(Debug, Clone, Default)]
pub struct InquiryFilter {
    pub status: Option<InquiryStatus>,
    pub kind: Option<InquiryKind>,
}

const FILTER: &str = "WHERE ($1::text IS NULL OR status = $1) AND ($2::text IS NULL OR kind = $2)";

pub struct InquiryRepo;

impl InquiryRepo {
    pub async fn create(db: impl PgExecutor<'_>, input: &InquiryInput) -> Result<Inquiry, sqlx::Error> {
        let query = format!(
            "INSERT INTO inquiries (id, kind, name, email, phone, message, artwork_id, variant_id, quantity) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Inquiry>(&query)
            .bind(Uuid::now_v7())
            .bind(input.kind.as_str())
            .bind(input.name.trim())
            .bind(input.email.trim().to_lowercase())
            .bind(&input.phone)
            .bind(input.message.trim())
            .bind(input.artwork_id)
            .bind(input.variant_id)
            .bind(input.quantity)
            .fetch_one(db)
            .await
    }

    pub async fn list(db: impl PgExecutor<'_>, filter: &InquiryFilter, limit: i64, offset: i64) -> Result<Vec<Inquiry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM inquiries {FILTER} ORDER BY created_at DESC LIMIT $3 OFFSET $4");
        sqlx::query_as::<_, Inquiry>(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.kind.map(|k| k.as_str()))
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await
    }

    pub async fn count(db: impl PgExecutor<'_>, filter: &InquiryFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM inquiries {FILTER}");
        let (total,): (i64,) = sqlx::query_as(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.kind.map(|k| k.as_str()))
            .fetch_one(db)
            .await?;
        Ok(total)
    }

    pub async fn set_status(db: impl PgExecutor<'_>, id: Uuid, status: InquiryStatus) -> Result<Option<Inquiry>, sqlx::Error> {
        let query = format!("UPDATE inquiries SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Inquiry>(&query).bind(id).bind(status.as_str()).fetch_optional(db).await
    }
}
