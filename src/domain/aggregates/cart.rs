//! Cart Aggregate

use serde::Serialize;
use uuid::Uuid;
use crate::domain::value_objects::Money;

/// Priced cart used for quotes and checkout. Lines for the same artwork and
/// variant are merged.
#[derive(Clone, Debug, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    subtotal: Money,
    currency: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub artwork_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub title: String,
    pub variant_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub processing_days: i32,
}

impl CartLine {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

impl Cart {
    pub fn new(currency: &str) -> Self {
        Self { lines: vec![], subtotal: Money::zero(currency), currency: currency.to_string() }
    }

    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    /// Total pieces requested per artwork, across its variants.
    pub fn quantity_for(&self, artwork_id: Uuid) -> u32 {
        self.lines.iter().filter(|l| l.artwork_id == artwork_id).map(|l| l.quantity).sum()
    }

    /// Longest processing time over all lines, in days.
    pub fn processing_days(&self) -> i32 {
        self.lines.iter().map(|l| l.processing_days).max().unwrap_or(0)
    }

    pub fn add_line(&mut self, line: CartLine) {
        if let Some(existing) = self.lines.iter_mut().find(|l| l.artwork_id == line.artwork_id && l.variant_id == line.variant_id) {
            existing.quantity += line.quantity;
        } else {
            self.lines.push(line);
        }
        self.recalculate();
    }

    fn recalculate(&mut self) {
        self.subtotal = self.lines.iter().fold(Money::zero(&self.currency), |acc, l| acc.add(&l.line_total()).unwrap_or(acc));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(artwork_id: Uuid, variant_id: Option<Uuid>, qty: u32, cents: i64, days: i32) -> CartLine {
        CartLine {
            artwork_id, variant_id, title: "Still Water".into(), variant_name: None,
            quantity: qty, unit_price: Money::new(cents, "ZAR"), processing_days: days,
        }
    }

    #[test]
    fn test_cart_merges_same_artwork_and_variant() {
        let art = Uuid::now_v7();
        let frame = Uuid::now_v7();
        let mut cart = Cart::new("ZAR");
        cart.add_line(line(art, None, 1, 50_000, 0));
        cart.add_line(line(art, None, 1, 50_000, 0));
        cart.add_line(line(art, Some(frame), 1, 65_000, 7));
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[0].quantity, 2); // Merged
        assert_eq!(cart.subtotal().cents(), 165_000);
        assert_eq!(cart.quantity_for(art), 3);
        assert_eq!(cart.processing_days(), 7);
    }
}
