//! Repository for the `orders`, `order_items` and `order_updates` tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::domain::aggregates::{Order as OrderAggregate, OrderStatus, PaymentStatus};

const COLUMNS: &str = "\
    id, order_number, customer_name, customer_email, customer_phone, shipping_address, country, \
    status, payment_status, payment_provider, payment_mode, payment_reference, currency, \
    subtotal, shipping, vat, total, deposit_percentage, deposit_amount, balance_amount, \
    balance_due_at, amount_paid, notes, tracking_number, created_at, updated_at";

const ITEM_COLUMNS: &str = "\
    id, order_id, artwork_id, variant_id, title, variant_name, quantity, unit_price, total, processing_days";

const UPDATE_COLUMNS: &str = "id, order_id, status, message, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: serde_json::Value,
    pub country: String,
    pub status: String,
    pub payment_status: String,
    pub payment_provider: String,
    pub payment_mode: String,
    pub payment_reference: Option<String>,
    pub currency: String,
    pub subtotal: i64,
    pub shipping: i64,
    pub vat: i64,
    pub total: i64,
    pub deposit_percentage: Option<i16>,
    pub deposit_amount: Option<i64>,
    pub balance_amount: Option<i64>,
    pub balance_due_at: Option<DateTime<Utc>>,
    pub amount_paid: i64,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Rebuilds the lifecycle aggregate; statuses are constrained by the schema.
    pub fn lifecycle(&self) -> Result<OrderAggregate, crate::domain::UnknownVariant> {
        Ok(OrderAggregate::restore(self.id, self.status.parse()?, self.payment_status.parse()?))
    }

    pub fn amount_outstanding(&self) -> i64 {
        (self.total - self.amount_paid).max(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub artwork_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub title: String,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub total: i64,
    pub processing_days: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderUpdate {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: serde_json::Value,
    pub country: String,
    pub payment_provider: String,
    pub payment_mode: String,
    pub currency: String,
    pub subtotal: i64,
    pub shipping: i64,
    pub vat: i64,
    pub total: i64,
    pub deposit_percentage: Option<i16>,
    pub deposit_amount: Option<i64>,
    pub balance_amount: Option<i64>,
    pub balance_due_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub artwork_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub title: String,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub processing_days: i32,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub search: Option<String>,
}

const FILTER: &str = "\
    WHERE ($1::text IS NULL OR status = $1) \
      AND ($2::text IS NULL OR payment_status = $2) \
      AND ($3::text IS NULL OR order_number ILIKE '%' || $3 || '%' \
           OR customer_email ILIKE '%' || $3 || '%' OR customer_name ILIKE '%' || $3 || '%')";

pub struct OrderRepo;

impl OrderRepo {
    pub async fn insert(db: impl PgExecutor<'_>, order: &NewOrder) -> Result<Order, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders \
                 (id, order_number, customer_name, customer_email, customer_phone, shipping_address, country, \
                  payment_provider, payment_mode, currency, subtotal, shipping, vat, total, \
                  deposit_percentage, deposit_amount, balance_amount, balance_due_at, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(order.id)
            .bind(&order.order_number)
            .bind(&order.customer_name)
            .bind(&order.customer_email)
            .bind(&order.customer_phone)
            .bind(&order.shipping_address)
            .bind(&order.country)
            .bind(&order.payment_provider)
            .bind(&order.payment_mode)
            .bind(&order.currency)
            .bind(order.subtotal)
            .bind(order.shipping)
            .bind(order.vat)
            .bind(order.total)
            .bind(order.deposit_percentage)
            .bind(order.deposit_amount)
            .bind(order.balance_amount)
            .bind(order.balance_due_at)
            .bind(&order.notes)
            .fetch_one(db)
            .await
    }

    pub async fn insert_item(db: impl PgExecutor<'_>, order_id: Uuid, item: &NewOrderItem) -> Result<OrderItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO order_items \
                 (id, order_id, artwork_id, variant_id, title, variant_name, quantity, unit_price, total, processing_days) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(Uuid::now_v7())
            .bind(order_id)
            .bind(item.artwork_id)
            .bind(item.variant_id)
            .bind(&item.title)
            .bind(&item.variant_name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.unit_price * i64::from(item.quantity))
            .bind(item.processing_days)
            .fetch_one(db)
            .await
    }

    pub async fn find_by_id(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query).bind(id).fetch_optional(db).await
    }

    /// Row-locks the order for the rest of the transaction.
    pub async fn lock(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Order>(&query).bind(id).fetch_optional(db).await
    }

    pub async fn find_for_tracking(
        db: impl PgExecutor<'_>,
        order_number: &str,
        email: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders WHERE order_number = $1 AND LOWER(customer_email) = LOWER($2)"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(order_number.trim().to_uppercase())
            .bind(email.trim())
            .fetch_optional(db)
            .await
    }

    pub async fn list(db: impl PgExecutor<'_>, filter: &OrderFilter, limit: i64, offset: i64) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders {FILTER} ORDER BY created_at DESC LIMIT $4 OFFSET $5");
        sqlx::query_as::<_, Order>(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.payment_status.map(|s| s.as_str()))
            .bind(filter.search.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await
    }

    pub async fn count(db: impl PgExecutor<'_>, filter: &OrderFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM orders {FILTER}");
        let (total,): (i64,) = sqlx::query_as(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.payment_status.map(|s| s.as_str()))
            .bind(filter.search.as_deref())
            .fetch_one(db)
            .await?;
        Ok(total)
    }

    pub async fn items(db: impl PgExecutor<'_>, order_id: Uuid) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY title");
        sqlx::query_as::<_, OrderItem>(&query).bind(order_id).fetch_all(db).await
    }

    pub async fn set_payment_reference(
        db: impl PgExecutor<'_>,
        id: Uuid,
        reference: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET payment_reference = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(reference)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Writes the lifecycle state back and adds `paid` to the running total.
    pub async fn save_payment(
        db: impl PgExecutor<'_>,
        order: &OrderAggregate,
        paid: i64,
        reference: &str,
    ) -> Result<Order, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET \
                 status = $2, payment_status = $3, amount_paid = LEAST(total, amount_paid + $4), \
                 payment_reference = $5, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(order.id())
            .bind(order.status().as_str())
            .bind(order.payment_status().as_str())
            .bind(paid)
            .bind(reference)
            .fetch_one(db)
            .await
    }

    pub async fn save_status(
        db: impl PgExecutor<'_>,
        order: &OrderAggregate,
        tracking_number: Option<&str>,
    ) -> Result<Order, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET \
                 status = $2, payment_status = $3, tracking_number = COALESCE($4, tracking_number), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(order.id())
            .bind(order.status().as_str())
            .bind(order.payment_status().as_str())
            .bind(tracking_number)
            .fetch_one(db)
            .await
    }

    pub async fn add_update(
        db: impl PgExecutor<'_>,
        order_id: Uuid,
        status: &str,
        message: Option<&str>,
    ) -> Result<OrderUpdate, sqlx::Error> {
        let query = format!(
            "INSERT INTO order_updates (id, order_id, status, message) VALUES ($1, $2, $3, $4) \
             RETURNING {UPDATE_COLUMNS}"
        );
        sqlx::query_as::<_, OrderUpdate>(&query)
            .bind(Uuid::now_v7())
            .bind(order_id)
            .bind(status)
            .bind(message)
            .fetch_one(db)
            .await
    }

    pub async fn updates(db: impl PgExecutor<'_>, order_id: Uuid) -> Result<Vec<OrderUpdate>, sqlx::Error> {
        let query = format!("SELECT {UPDATE_COLUMNS} FROM order_updates WHERE order_id = $1 ORDER BY created_at");
        sqlx::query_as::<_, OrderUpdate>(&query).bind(order_id).fetch_all(db).await
    }
}
