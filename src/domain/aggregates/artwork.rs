//! Artwork Aggregate

text_enum! {
    ArtworkStatus {
        Available => "available",
        Sold => "sold",
        Reserved => "reserved",
    }
}

text_enum! {
    Scale {
        Small => "small",
        Medium => "medium",
        Large => "large",
        Oversized => "oversized",
    }
}

text_enum! {
    /// Priced add-on attached to an artwork.
    VariantKind {
        Frame => "frame",
        Canvas => "canvas",
        Print => "print",
    }
}

use super::order::PaymentKind;

/// Stock and availability of a single artwork.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StockLevel {
    pub stock: i32,
    pub status: ArtworkStatus,
}

impl StockLevel {
    pub fn new(stock: i32, status: ArtworkStatus) -> Self { Self { stock, status } }

    pub fn ensure_available(&self, quantity: u32) -> Result<(), ArtworkError> {
        match self.status {
            ArtworkStatus::Sold => return Err(ArtworkError::Sold),
            ArtworkStatus::Reserved => return Err(ArtworkError::Reserved),
            ArtworkStatus::Available => {}
        }
        if i64::from(self.stock) < i64::from(quantity) {
            return Err(ArtworkError::InsufficientStock { requested: quantity, in_stock: self.stock });
        }
        Ok(())
    }

    /// Stock after a confirmed charge. A deposit takes stock and reserves the
    /// last piece; the balance only turns a reservation into a sale.
    pub fn after_payment(&self, quantity: u32, kind: PaymentKind) -> Self {
        let stock = match kind {
            PaymentKind::Balance => self.stock,
            PaymentKind::Full | PaymentKind::Deposit => {
                self.stock.saturating_sub(i32::try_from(quantity).unwrap_or(i32::MAX)).max(0)
            }
        };
        let status = match (stock, kind) {
            (0, PaymentKind::Deposit) => ArtworkStatus::Reserved,
            (0, _) => ArtworkStatus::Sold,
            (_, PaymentKind::Balance) => self.status,
            _ => ArtworkStatus::Available,
        };
        Self { stock, status }
    }

    /// Pieces a charge of `kind` takes beyond what is left. Non-zero means two
    /// orders were paid for the same stock.
    pub fn shortfall(&self, quantity: u32, kind: PaymentKind) -> u32 {
        match kind {
            PaymentKind::Balance => 0,
            PaymentKind::Full | PaymentKind::Deposit => {
                let left = u32::try_from(self.stock.max(0)).unwrap_or(0);
                quantity.saturating_sub(left)
            }
        }
    }

    /// Returns stock held by a cancelled order.
    pub fn after_restock(&self, quantity: u32) -> Self {
        let stock = self.stock.saturating_add(i32::try_from(quantity).unwrap_or(i32::MAX));
        Self { stock, status: ArtworkStatus::Available }
    }
}

/// Artwork price plus a variant adjustment, floored at zero.
pub fn unit_price(artwork_price: i64, variant_adjustment: Option<i64>) -> i64 {
    (artwork_price + variant_adjustment.unwrap_or(0)).max(0)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtworkError {
    #[error("artwork is sold")]
    Sold,
    #[error("artwork is reserved")]
    Reserved,
    #[error("only {in_stock} in stock, {requested} requested")]
    InsufficientStock { requested: u32, in_stock: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability() {
        assert!(StockLevel::new(2, ArtworkStatus::Available).ensure_available(2).is_ok());
        assert_eq!(StockLevel::new(1, ArtworkStatus::Sold).ensure_available(1), Err(ArtworkError::Sold));
        assert_eq!(
            StockLevel::new(1, ArtworkStatus::Available).ensure_available(3),
            Err(ArtworkError::InsufficientStock { requested: 3, in_stock: 1 })
        );
    }

    #[test]
    fn test_full_payment_sells_last_piece() {
        let after = StockLevel::new(1, ArtworkStatus::Available).after_payment(1, PaymentKind::Full);
        assert_eq!(after, StockLevel::new(0, ArtworkStatus::Sold));
        let editions = StockLevel::new(5, ArtworkStatus::Available).after_payment(2, PaymentKind::Full);
        assert_eq!(editions, StockLevel::new(3, ArtworkStatus::Available));
    }

    #[test]
    fn test_deposit_reserves_then_balance_sells() {
        let reserved = StockLevel::new(1, ArtworkStatus::Available).after_payment(1, PaymentKind::Deposit);
        assert_eq!(reserved, StockLevel::new(0, ArtworkStatus::Reserved));
        let sold = reserved.after_payment(1, PaymentKind::Balance);
        assert_eq!(sold, StockLevel::new(0, ArtworkStatus::Sold));
    }

    #[test]
    fn test_second_sale_of_last_piece_falls_short() {
        let first = StockLevel::new(1, ArtworkStatus::Available);
        assert_eq!(first.shortfall(1, PaymentKind::Full), 0);
        let second = first.after_payment(1, PaymentKind::Full);
        assert_eq!(second.shortfall(1, PaymentKind::Full), 1);
        assert_eq!(StockLevel::new(2, ArtworkStatus::Available).shortfall(3, PaymentKind::Deposit), 1);
    }

    #[test]
    fn test_balance_never_falls_short() {
        let reserved = StockLevel::new(0, ArtworkStatus::Reserved);
        assert_eq!(reserved.shortfall(1, PaymentKind::Balance), 0);
    }

    #[test]
    fn test_restock() {
        let back = StockLevel::new(0, ArtworkStatus::Reserved).after_restock(1);
        assert_eq!(back, StockLevel::new(1, ArtworkStatus::Available));
    }

    #[test]
    fn test_unit_price_floor() {
        assert_eq!(unit_price(100_000, Some(25_000)), 125_000);
        assert_eq!(unit_price(10_000, Some(-20_000)), 0);
        assert_eq!(unit_price(10_000, None), 10_000);
    }
}
