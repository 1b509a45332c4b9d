//! Order Aggregate

use chrono::NaiveDate;
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;
use crate::domain::events::{DomainEvent, OrderEvent};

text_enum! {
    OrderStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Processing => "processing",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
    }
}

text_enum! {
    PaymentStatus {
        Pending => "pending",
        DepositPaid => "deposit_paid",
        Paid => "paid",
        Failed => "failed",
        Refunded => "refunded",
    }
}

text_enum! {
    /// Card processor used for an order.
    PaymentProvider {
        Stripe => "stripe",
        Yoco => "yoco",
    }
}

text_enum! {
    /// How the customer chose to pay at checkout.
    PaymentMode {
        Full => "full",
        Deposit => "deposit",
    }
}

text_enum! {
    /// What a single provider charge pays for.
    PaymentKind {
        Full => "full",
        Deposit => "deposit",
        Balance => "balance",
    }
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }
}

impl PaymentStatus {
    /// Stock has been taken out of the catalogue for this order.
    pub fn holds_stock(&self) -> bool { matches!(self, Self::DepositPaid | Self::Paid) }
}

#[derive(Clone, Debug)]
pub struct Order {
    id: Uuid,
    status: OrderStatus,
    payment: PaymentStatus,
    events: Vec<DomainEvent>,
}

impl Order {
    pub fn place(id: Uuid, order_number: impl Into<String>, total: i64) -> Self {
        let mut order = Self::restore(id, OrderStatus::Pending, PaymentStatus::Pending);
        order.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id: id, order_number: order_number.into(), total }));
        order
    }

    pub fn restore(id: Uuid, status: OrderStatus, payment: PaymentStatus) -> Self {
        Self { id, status, payment, events: vec![] }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_status(&self) -> PaymentStatus { self.payment }

    /// Applies a confirmed provider charge. Returns `false` when the charge is already reflected.
    pub fn record_payment(&mut self, kind: PaymentKind) -> Result<bool, OrderError> {
        if self.status == OrderStatus::Cancelled { return Err(OrderError::Cancelled); }
        let next = match (kind, self.payment) {
            (_, PaymentStatus::Paid | PaymentStatus::Refunded) => return Ok(false),
            (PaymentKind::Deposit, PaymentStatus::DepositPaid) => return Ok(false),
            (PaymentKind::Balance, PaymentStatus::DepositPaid) => PaymentStatus::Paid,
            (PaymentKind::Balance, _) => return Err(OrderError::BalanceBeforeDeposit),
            (PaymentKind::Deposit, _) => PaymentStatus::DepositPaid,
            (PaymentKind::Full, _) => PaymentStatus::Paid,
        };
        self.payment = next;
        if self.status == OrderStatus::Pending { self.status = OrderStatus::Confirmed; }
        self.raise_event(DomainEvent::Order(OrderEvent::PaymentReceived {
            order_id: self.id,
            kind: kind.as_str().to_string(),
            payment_status: next.as_str().to_string(),
        }));
        Ok(true)
    }

    /// Marks a pending payment as failed. Anything already paid is left alone.
    pub fn record_payment_failure(&mut self) -> bool {
        if self.payment != PaymentStatus::Pending { return false; }
        self.payment = PaymentStatus::Failed;
        self.raise_event(DomainEvent::Order(OrderEvent::PaymentFailed { order_id: self.id }));
        true
    }

    /// Returns the previous status.
    pub fn set_status(&mut self, to: OrderStatus) -> Result<OrderStatus, OrderError> {
        let from = self.status;
        if from == to { return Err(OrderError::Unchanged(to)); }
        if from.is_terminal() { return Err(OrderError::Terminal(from)); }
        self.status = to;
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged {
            order_id: self.id,
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        }));
        Ok(from)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

/// `ORD-YYYYMMDD-XXXXXX` with an uppercase alphanumeric suffix.
pub fn order_number<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> String {
    let suffix: String = (0..6).map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase()).collect();
    format!("ORD-{}-{suffix}", date.format("%Y%m%d"))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("order is already {0}")]
    Unchanged(OrderStatus),
    #[error("order is {0} and can no longer change")]
    Terminal(OrderStatus),
    #[error("order is cancelled")]
    Cancelled,
    #[error("balance paid before deposit")]
    BalanceBeforeDeposit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_order_number_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let number = order_number(date, &mut StdRng::seed_from_u64(7));
        assert!(number.starts_with("ORD-20260301-"));
        let suffix = &number["ORD-20260301-".len()..];
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_full_payment_confirms_order() {
        let mut order = Order::place(Uuid::now_v7(), "ORD-1", 10_000);
        assert!(order.record_payment(PaymentKind::Full).unwrap());
        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        assert_eq!(order.take_events().len(), 2);
    }

    #[test]
    fn test_payment_replay_is_noop() {
        let mut order = Order::restore(Uuid::now_v7(), OrderStatus::Confirmed, PaymentStatus::Paid);
        assert!(!order.record_payment(PaymentKind::Full).unwrap());
        assert!(order.take_events().is_empty());
    }

    #[test]
    fn test_deposit_then_balance() {
        let mut order = Order::restore(Uuid::now_v7(), OrderStatus::Pending, PaymentStatus::Pending);
        assert_eq!(order.record_payment(PaymentKind::Balance), Err(OrderError::BalanceBeforeDeposit));
        assert!(order.record_payment(PaymentKind::Deposit).unwrap());
        assert_eq!(order.payment_status(), PaymentStatus::DepositPaid);
        assert!(!order.record_payment(PaymentKind::Deposit).unwrap());
        assert!(order.record_payment(PaymentKind::Balance).unwrap());
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
    }

    #[test]
    fn test_payment_on_cancelled_order_rejected() {
        let mut order = Order::restore(Uuid::now_v7(), OrderStatus::Cancelled, PaymentStatus::Pending);
        assert_eq!(order.record_payment(PaymentKind::Full), Err(OrderError::Cancelled));
    }

    #[test]
    fn test_failure_only_from_pending() {
        let mut order = Order::restore(Uuid::now_v7(), OrderStatus::Pending, PaymentStatus::Pending);
        assert!(order.record_payment_failure());
        assert_eq!(order.payment_status(), PaymentStatus::Failed);
        assert!(!order.record_payment_failure());
        // a later successful retry still lands
        assert!(order.record_payment(PaymentKind::Full).unwrap());
    }

    #[test]
    fn test_status_guards() {
        let mut order = Order::restore(Uuid::now_v7(), OrderStatus::Confirmed, PaymentStatus::Paid);
        assert_eq!(order.set_status(OrderStatus::Confirmed), Err(OrderError::Unchanged(OrderStatus::Confirmed)));
        assert_eq!(order.set_status(OrderStatus::Shipped), Ok(OrderStatus::Confirmed));
        assert_eq!(order.set_status(OrderStatus::Delivered), Ok(OrderStatus::Shipped));
        assert_eq!(order.set_status(OrderStatus::Cancelled), Err(OrderError::Terminal(OrderStatus::Delivered)));
    }

    #[test]
    fn test_status_text_roundtrip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
        assert!("archived".parse::<OrderStatus>().is_err());
        assert_eq!(serde_json::to_string(&PaymentStatus::DepositPaid).unwrap(), "\"deposit_paid\"");
    }
}
