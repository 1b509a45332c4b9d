//! Aggregates module
pub mod artwork;
pub mod cart;
pub mod inquiry;
pub mod order;

pub use artwork::{unit_price, ArtworkError, ArtworkStatus, Scale, StockLevel, VariantKind};
pub use cart::{Cart, CartLine};
pub use inquiry::{InquiryKind, InquiryStatus};
pub use order::{order_number, Order, OrderError, OrderStatus, PaymentKind, PaymentMode, PaymentProvider, PaymentStatus};
