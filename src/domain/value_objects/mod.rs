//! Value Objects for the gallery store

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// URL slug value object (artworks, updates)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    /// Lowercases, keeps ASCII alphanumerics, collapses everything else into single dashes.
    pub fn new(value: impl AsRef<str>) -> Result<Self, SlugError> {
        let mut slug = String::new();
        for c in value.as_ref().trim().chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        let slug = slug.trim_end_matches('-').to_string();
        if slug.is_empty() { return Err(SlugError::Empty); }
        if slug.len() > 120 { return Err(SlugError::TooLong); }
        Ok(Self(slug))
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SlugError { Empty, TooLong }
impl std::error::Error for SlugError {}
impl fmt::Display for SlugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "slug empty"), Self::TooLong => write!(f, "slug too long") }
    }
}

/// Money value object, held in minor units (cents)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { cents: i64, currency: String }

impl Money {
    pub fn new(cents: i64, currency: &str) -> Self { Self { cents, currency: currency.to_uppercase() } }
    pub fn zero(currency: &str) -> Self { Self::new(0, currency) }
    pub fn cents(&self) -> i64 { self.cents }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.cents + other.cents, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.cents * i64::from(qty), &self.currency) }

    /// Applies a rate and rounds half away from zero to whole cents.
    pub fn apply_rate(&self, rate: Decimal) -> Money {
        Money::new(round_cents(Decimal::from(self.cents) * rate), &self.currency)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum MoneyError { CurrencyMismatch }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Currency mismatch") }
}

pub fn round_cents(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(i64::MAX)
}

pub fn format_cents(cents: i64, currency: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();
    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 { grouped.push(' '); }
        grouped.push(c);
    }
    format!("{currency} {sign}{grouped}.{:02}", abs % 100)
}

/// Share of the order total paid upfront to reserve an artwork
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DepositPercentage(u8);

impl DepositPercentage {
    pub const ALLOWED: [u8; 3] = [30, 40, 50];
    pub fn new(value: u8) -> Result<Self, DepositError> {
        if Self::ALLOWED.contains(&value) { Ok(Self(value)) } else { Err(DepositError::NotAllowed(value)) }
    }
    pub fn value(&self) -> u8 { self.0 }
    pub fn as_rate(&self) -> Decimal { Decimal::new(i64::from(self.0), 2) }
}

impl TryFrom<u8> for DepositPercentage {
    type Error = DepositError;
    fn try_from(value: u8) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<DepositPercentage> for u8 {
    fn from(p: DepositPercentage) -> u8 { p.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum DepositError { NotAllowed(u8) }
impl std::error::Error for DepositError {}
impl fmt::Display for DepositError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::NotAllowed(v) => write!(f, "deposit percentage {v} not one of 30, 40, 50") }
    }
}

/// Two-letter ISO country code, uppercased
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let code = value.as_ref().trim().to_ascii_uppercase();
        (code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())).then_some(Self(code))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_slug() {
        assert_eq!(Slug::new("  Blue Horizon (2023) ").unwrap().as_str(), "blue-horizon-2023");
        assert_eq!(Slug::new("!!!"), Err(SlugError::Empty));
    }
    #[test]
    fn test_money_add() {
        let a = Money::new(10_000, "zar");
        let b = Money::new(5_050, "ZAR");
        assert_eq!(a.add(&b).unwrap().cents(), 15_050);
        assert!(a.add(&Money::new(1, "USD")).is_err());
    }
    #[test]
    fn test_apply_rate_rounds_half_away_from_zero() {
        // 15% of 1 003 cents = 150.45 -> 150, of 1 010 = 151.5 -> 152
        assert_eq!(Money::new(1_003, "ZAR").apply_rate(Decimal::new(15, 2)).cents(), 150);
        assert_eq!(Money::new(1_010, "ZAR").apply_rate(Decimal::new(15, 2)).cents(), 152);
    }
    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(123_456_789, "ZAR"), "ZAR 1 234 567.89");
        assert_eq!(format_cents(5, "ZAR"), "ZAR 0.05");
    }
    #[test]
    fn test_deposit_percentage() {
        assert!(DepositPercentage::new(40).is_ok());
        assert_eq!(DepositPercentage::new(25), Err(DepositError::NotAllowed(25)));
        let parsed: Result<DepositPercentage, _> = serde_json::from_str("35");
        assert!(parsed.is_err());
    }
    #[test]
    fn test_country_code() {
        assert_eq!(CountryCode::new("za").unwrap().as_str(), "ZA");
        assert!(CountryCode::new("ZAF").is_none());
    }
}
