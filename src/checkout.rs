//! Checkout calculator: subtotal → shipping → VAT → total, plus the deposit split.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::PaymentMode;
use crate::domain::value_objects::{round_cents, CountryCode, DepositError, DepositPercentage, Money};

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub currency: String,
    pub home_country: CountryCode,
    pub domestic_shipping: i64,
    pub free_shipping_threshold: i64,
    pub international_shipping: i64,
    pub vat_rate: Decimal,
    pub vat_exempt_international: bool,
    pub deposit_balance_due_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub currency: String,
    pub subtotal: i64,
    pub shipping: i64,
    pub vat: i64,
    pub total: i64,
    pub international: bool,
    pub processing_days: i32,
    pub estimated_dispatch_at: DateTime<Utc>,
    pub deposit: Option<DepositSplit>,
}

impl Quote {
    /// Amount charged now: the deposit when one applies, the total otherwise.
    pub fn amount_due_now(&self) -> i64 {
        self.deposit.as_ref().map_or(self.total, |d| d.deposit_amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositSplit {
    pub percentage: u8,
    pub deposit_amount: i64,
    pub balance_amount: i64,
    pub balance_due_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("'{0}' is not a two-letter country code")]
    InvalidCountry(String),
    #[error("deposit mode requires a deposit percentage")]
    MissingDepositPercentage,
    #[error(transparent)]
    InvalidDepositPercentage(#[from] DepositError),
}

/// How the customer pays, with the percentage when paying a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPlan {
    pub mode: PaymentMode,
    pub deposit_percentage: Option<u8>,
}

impl PaymentPlan {
    pub fn full() -> Self { Self { mode: PaymentMode::Full, deposit_percentage: None } }
    pub fn deposit(percentage: u8) -> Self { Self { mode: PaymentMode::Deposit, deposit_percentage: Some(percentage) } }
}

pub fn shipping_for(config: &PricingConfig, subtotal: i64, international: bool) -> i64 {
    if international {
        config.international_shipping
    } else if subtotal >= config.free_shipping_threshold {
        0
    } else {
        config.domestic_shipping
    }
}

pub fn quote(
    config: &PricingConfig,
    subtotal: i64,
    processing_days: i32,
    country: &str,
    plan: PaymentPlan,
    now: DateTime<Utc>,
) -> Result<Quote, PricingError> {
    if subtotal <= 0 {
        return Err(PricingError::EmptyCart);
    }
    let country = CountryCode::new(country).ok_or_else(|| PricingError::InvalidCountry(country.to_string()))?;
    let international = country != config.home_country;

    let shipping = shipping_for(config, subtotal, international);
    let vat = if international && config.vat_exempt_international {
        0
    } else {
        Money::new(subtotal + shipping, &config.currency).apply_rate(config.vat_rate).cents()
    };
    let total = subtotal + shipping + vat;

    let deposit = match plan.mode {
        PaymentMode::Full => None,
        PaymentMode::Deposit => {
            let pct = DepositPercentage::new(plan.deposit_percentage.ok_or(PricingError::MissingDepositPercentage)?)?;
            Some(split_deposit(total, pct, now + Duration::days(config.deposit_balance_due_days)))
        }
    };

    Ok(Quote {
        currency: config.currency.clone(),
        subtotal,
        shipping,
        vat,
        total,
        international,
        processing_days,
        estimated_dispatch_at: now + Duration::days(i64::from(processing_days.max(0))),
        deposit,
    })
}

/// Balance is the remainder so deposit + balance always equals the total.
pub fn split_deposit(total: i64, percentage: DepositPercentage, balance_due_at: DateTime<Utc>) -> DepositSplit {
    let deposit_amount = round_cents(Decimal::from(total) * percentage.as_rate());
    DepositSplit {
        percentage: percentage.value(),
        deposit_amount,
        balance_amount: total - deposit_amount,
        balance_due_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> PricingConfig {
        PricingConfig {
            currency: "ZAR".into(),
            home_country: CountryCode::new("ZA").unwrap(),
            domestic_shipping: 15_000,
            free_shipping_threshold: 500_000,
            international_shipping: 85_000,
            vat_rate: Decimal::new(15, 2),
            vat_exempt_international: true,
            deposit_balance_due_days: 30,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn domestic_below_threshold_pays_flat_shipping_and_vat() {
        let q = quote(&config(), 100_000, 0, "ZA", PaymentPlan::full(), now()).unwrap();
        assert_eq!(q.shipping, 15_000);
        assert_eq!(q.vat, 17_250); // 15% of 1 150.00
        assert_eq!(q.total, 132_250);
        assert!(!q.international);
        assert_eq!(q.amount_due_now(), q.total);
    }

    #[test]
    fn domestic_at_threshold_ships_free() {
        let q = quote(&config(), 500_000, 0, "za", PaymentPlan::full(), now()).unwrap();
        assert_eq!(q.shipping, 0);
        assert_eq!(q.vat, 75_000);
        assert_eq!(q.total, 575_000);
    }

    #[test]
    fn international_pays_flat_rate_and_is_zero_rated() {
        let q = quote(&config(), 900_000, 0, "GB", PaymentPlan::full(), now()).unwrap();
        assert!(q.international);
        assert_eq!(q.shipping, 85_000);
        assert_eq!(q.vat, 0);
        assert_eq!(q.total, 985_000);
    }

    #[test]
    fn international_vat_when_not_exempt() {
        let cfg = PricingConfig { vat_exempt_international: false, ..config() };
        let q = quote(&cfg, 100_000, 0, "US", PaymentPlan::full(), now()).unwrap();
        assert_eq!(q.vat, 27_750);
    }

    #[test]
    fn empty_cart_rejected() {
        assert_eq!(quote(&config(), 0, 0, "ZA", PaymentPlan::full(), now()), Err(PricingError::EmptyCart));
    }

    #[test]
    fn bad_country_rejected() {
        assert!(matches!(
            quote(&config(), 10_000, 0, "South Africa", PaymentPlan::full(), now()),
            Err(PricingError::InvalidCountry(_))
        ));
    }

    #[test]
    fn deposit_and_balance_reconstitute_total() {
        for subtotal in [1_001, 99_999, 123_457, 4_999_999] {
            for pct in DepositPercentage::ALLOWED {
                let q = quote(&config(), subtotal, 0, "ZA", PaymentPlan::deposit(pct), now()).unwrap();
                let d = q.deposit.as_ref().unwrap();
                assert_eq!(d.deposit_amount + d.balance_amount, q.total);
                assert_eq!(d.percentage, pct);
                assert_eq!(q.amount_due_now(), d.deposit_amount);
            }
        }
    }

    #[test]
    fn deposit_due_date_offset() {
        let q = quote(&config(), 200_000, 14, "ZA", PaymentPlan::deposit(30), now()).unwrap();
        let d = q.deposit.unwrap();
        assert_eq!(d.balance_due_at, now() + Duration::days(30));
        assert_eq!(q.total, 247_250);
        assert_eq!(d.deposit_amount, 74_175);
        assert_eq!(d.balance_amount, 173_075);
        assert_eq!(q.estimated_dispatch_at, now() + Duration::days(14));
    }

    #[test]
    fn deposit_percentage_outside_set_rejected() {
        let err = quote(&config(), 200_000, 0, "ZA", PaymentPlan::deposit(25), now()).unwrap_err();
        assert_eq!(err, PricingError::InvalidDepositPercentage(DepositError::NotAllowed(25)));
        let missing = PaymentPlan { mode: PaymentMode::Deposit, deposit_percentage: None };
        assert_eq!(quote(&config(), 200_000, 0, "ZA", missing, now()), Err(PricingError::MissingDepositPercentage));
    }
}
