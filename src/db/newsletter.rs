//! Repository for the `newsletter_subscribers` table. Emails are stored lowercased.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

const COLUMNS: &str = "id, email, subscribed_at, unsubscribed_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

impl Subscriber {
    pub fn is_active(&self) -> bool {
        self.unsubscribed_at.is_none()
    }
}

pub struct NewsletterRepo;

impl NewsletterRepo {
    pub async fn find_by_email(db: impl PgExecutor<'_>, email: &str) -> Result<Option<Subscriber>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM newsletter_subscribers WHERE email = $1");
        sqlx::query_as::<_, Subscriber>(&query).bind(email).fetch_optional(db).await
    }

    pub async fn insert(db: impl PgExecutor<'_>, email: &str) -> Result<Subscriber, sqlx::Error> {
        let query = format!("INSERT INTO newsletter_subscribers (id, email) VALUES ($1, $2) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Subscriber>(&query).bind(Uuid::now_v7()).bind(email).fetch_one(db).await
    }

    pub async fn resubscribe(db: impl PgExecutor<'_>, id: Uuid) -> Result<Subscriber, sqlx::Error> {
        let query = format!(
            "UPDATE newsletter_subscribers SET subscribed_at = NOW(), unsubscribed_at = NULL \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Subscriber>(&query).bind(id).fetch_one(db).await
    }

    /// Returns `None` when the email was never subscribed.
    pub async fn unsubscribe(db: impl PgExecutor<'_>, email: &str) -> Result<Option<Subscriber>, sqlx::Error> {
        let query = format!(
            "UPDATE newsletter_subscribers SET unsubscribed_at = COALESCE(unsubscribed_at, NOW()) \
             WHERE email = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Subscriber>(&query).bind(email).fetch_optional(db).await
    }
}
