//! Repository for the `order_invoices` table and the invoice number sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

const COLUMNS: &str = "id, order_id, invoice_number, storage_path, public_url, amount, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderInvoice {
    pub id: Uuid,
    pub order_id: Uuid,
    pub invoice_number: String,
    pub storage_path: String,
    pub public_url: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

pub struct InvoiceRepo;

impl InvoiceRepo {
    pub async fn next_sequence(db: impl PgExecutor<'_>) -> Result<i64, sqlx::Error> {
        let (seq,): (i64,) = sqlx::query_as("SELECT nextval('invoice_number_seq')").fetch_one(db).await?;
        Ok(seq)
    }

    pub async fn insert(
        db: impl PgExecutor<'_>,
        order_id: Uuid,
        invoice_number: &str,
        storage_path: &str,
        public_url: &str,
        amount: i64,
    ) -> Result<OrderInvoice, sqlx::Error> {
        let query = format!(
            "INSERT INTO order_invoices (id, order_id, invoice_number, storage_path, public_url, amount) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OrderInvoice>(&query)
            .bind(Uuid::now_v7())
            .bind(order_id)
            .bind(invoice_number)
            .bind(storage_path)
            .bind(public_url)
            .bind(amount)
            .fetch_one(db)
            .await
    }

    pub async fn list_for_order(db: impl PgExecutor<'_>, order_id: Uuid) -> Result<Vec<OrderInvoice>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM order_invoices WHERE order_id = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, OrderInvoice>(&query).bind(order_id).fetch_all(db).await
    }
}
