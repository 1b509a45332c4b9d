//! Domain events
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
    Inquiry(InquiryEvent),
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> String {
        match self {
            Self::Order(e) => format!("gallery.orders.{}", e.name()),
            Self::Inquiry(e) => format!("gallery.inquiries.{}", e.name()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, order_number: String, total: i64 },
    PaymentReceived { order_id: Uuid, kind: String, payment_status: String },
    PaymentFailed { order_id: Uuid },
    StatusChanged { order_id: Uuid, from: String, to: String },
}

impl OrderEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Placed { .. } => "placed",
            Self::PaymentReceived { .. } => "payment_received",
            Self::PaymentFailed { .. } => "payment_failed",
            Self::StatusChanged { .. } => "status_changed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InquiryEvent {
    Received { inquiry_id: Uuid, kind: String, artwork_id: Option<Uuid> },
}

impl InquiryEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Received { .. } => "received",
        }
    }
}
