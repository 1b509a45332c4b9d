//! Repository for the `cart_items` table (server-side session carts).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

const COLUMNS: &str = "id, session_id, artwork_id, variant_id, quantity, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub session_id: String,
    pub artwork_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

pub struct CartRepo;

impl CartRepo {
    pub async fn list(db: impl PgExecutor<'_>, session_id: &str) -> Result<Vec<CartItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cart_items WHERE session_id = $1 ORDER BY created_at");
        sqlx::query_as::<_, CartItem>(&query).bind(session_id).fetch_all(db).await
    }

    /// The line for an artwork and variant, locked for a merge.
    pub async fn find_line(
        db: impl PgExecutor<'_>,
        session_id: &str,
        artwork_id: Uuid,
        variant_id: Option<Uuid>,
    ) -> Result<Option<CartItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cart_items \
             WHERE session_id = $1 AND artwork_id = $2 AND variant_id IS NOT DISTINCT FROM $3 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, CartItem>(&query)
            .bind(session_id)
            .bind(artwork_id)
            .bind(variant_id)
            .fetch_optional(db)
            .await
    }

    /// Adds to an existing line for the same artwork and variant.
    pub async fn add(
        db: impl PgExecutor<'_>,
        session_id: &str,
        artwork_id: Uuid,
        variant_id: Option<Uuid>,
        quantity: i32,
        max_quantity: i32,
    ) -> Result<CartItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO cart_items (id, session_id, artwork_id, variant_id, quantity) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (session_id, artwork_id, COALESCE(variant_id, '00000000-0000-0000-0000-000000000000'::uuid)) \
             DO UPDATE SET quantity = LEAST(cart_items.quantity + EXCLUDED.quantity, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CartItem>(&query)
            .bind(Uuid::now_v7())
            .bind(session_id)
            .bind(artwork_id)
            .bind(variant_id)
            .bind(quantity)
            .bind(max_quantity)
            .fetch_one(db)
            .await
    }

    pub async fn set_quantity(
        db: impl PgExecutor<'_>,
        session_id: &str,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<Option<CartItem>, sqlx::Error> {
        let query = format!(
            "UPDATE cart_items SET quantity = $3 WHERE session_id = $1 AND id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CartItem>(&query)
            .bind(session_id)
            .bind(item_id)
            .bind(quantity)
            .fetch_optional(db)
            .await
    }

    pub async fn remove(db: impl PgExecutor<'_>, session_id: &str, item_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cart_items WHERE session_id = $1 AND id = $2")
            .bind(session_id)
            .bind(item_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn clear(db: impl PgExecutor<'_>, session_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cart_items WHERE session_id = $1").bind(session_id).execute(db).await?;
        Ok(result.rows_affected())
    }
}
