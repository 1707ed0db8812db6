use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use scrapyard_core::{DomainResult, Entity, Money, PaymentId, PurchaseId};

/// How much of a purchase has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

impl PaymentStatus {
    /// Classify a purchase from what has been paid against what is due.
    ///
    /// Overpayment counts as paid. Totals are always positive by the time a
    /// purchase is classified, so `paid == 0` can only mean pending.
    pub fn classify(paid: Money, total: Money) -> Self {
        if paid >= total {
            PaymentStatus::Paid
        } else if paid.is_positive() {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "partial" => Some(PaymentStatus::Partial),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

/// Free-form payment mode ("cash", "upi", "bank", ...). Defaults to cash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMode(String);

impl PaymentMode {
    pub const CASH: &'static str = "cash";

    pub fn new(mode: impl Into<String>) -> Self {
        let mode = mode.into();
        let trimmed = mode.trim();
        if trimmed.is_empty() {
            Self::default()
        } else {
            Self(trimmed.to_lowercase())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PaymentMode {
    fn default() -> Self {
        Self(Self::CASH.to_string())
    }
}

/// Payment handed over together with a deferred-payment purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTerms {
    pub amount: Money,
    pub mode: PaymentMode,
    pub note: String,
    pub date: NaiveDate,
}

impl PaymentTerms {
    /// No money handed over yet.
    pub fn unpaid(date: NaiveDate) -> Self {
        Self {
            amount: Money::ZERO,
            mode: PaymentMode::default(),
            note: String::new(),
            date,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.amount.is_zero() {
            return Ok(());
        }
        self.amount.ensure_positive("payment_amount").map(|_| ())
    }
}

/// Recorded payment against one purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub purchase_id: PurchaseId,
    pub amount: Money,
    pub mode: PaymentMode,
    pub note: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Entity for PaymentRecord {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn money(v: i64) -> Money {
        Money::new(Decimal::from(v))
    }

    #[test]
    fn classification_examples() {
        assert_eq!(PaymentStatus::classify(money(0), money(100)), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::classify(money(40), money(100)), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::classify(money(100), money(100)), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::classify(money(150), money(100)), PaymentStatus::Paid);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&PaymentStatus::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
        assert_eq!(PaymentStatus::parse("paid"), Some(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::parse("PAID"), None);
    }

    #[test]
    fn blank_mode_falls_back_to_cash() {
        assert_eq!(PaymentMode::new("  ").as_str(), "cash");
        assert_eq!(PaymentMode::new(" UPI ").as_str(), "upi");
    }

    #[test]
    fn negative_payment_is_invalid() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let mut terms = PaymentTerms::unpaid(date);
        assert!(terms.validate().is_ok());
        terms.amount = money(-5);
        assert!(terms.validate().is_err());
    }

    proptest! {
        /// Property: for a positive total, the three statuses partition the
        /// paid amount exactly along 0 and the total.
        #[test]
        fn classification_partitions_paid_amount(
            paid in 0i64..10_000_000i64,
            total in 1i64..10_000_000i64,
        ) {
            let status = PaymentStatus::classify(money(paid), money(total));
            let expected = if paid >= total {
                PaymentStatus::Paid
            } else if paid > 0 {
                PaymentStatus::Partial
            } else {
                PaymentStatus::Pending
            };
            prop_assert_eq!(status, expected);
        }
    }
}
