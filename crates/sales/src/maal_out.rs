use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use scrapyard_core::{
    DomainError, DomainResult, Entity, Money, Rate, SaleId, SalePaymentId, Scope, Weight,
};

/// Dispatch of material to a buying firm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub scope: Scope,
    pub firm_name: String,
    pub bill_to: Option<String>,
    pub date: NaiveDate,
    pub weight: Weight,
    pub rate: Rate,
    /// `weight * rate`, before GST and freight.
    pub amount: Money,
    /// GST as entered on the bill; stored, never applied to `amount`.
    pub gst: Option<Decimal>,
    pub freight: Option<Money>,
    pub vehicle_no: Option<String>,
    pub payment_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Request to record a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub scope: Scope,
    pub firm_name: String,
    pub bill_to: Option<String>,
    pub date: NaiveDate,
    pub weight: Weight,
    pub rate: Rate,
    pub gst: Option<Decimal>,
    pub freight: Option<Money>,
    pub vehicle_no: Option<String>,
    pub payment_type: Option<String>,
}

impl NewSale {
    pub fn into_sale(self, id: SaleId, created_at: DateTime<Utc>) -> DomainResult<Sale> {
        let firm_name = required_text(self.firm_name, "firm_name")?;
        let weight = self.weight.ensure_positive("weight")?;
        let rate = self.rate.ensure_positive("rate")?;
        let amount = weight.checked_mul(rate)?;
        if let Some(gst) = self.gst {
            if gst.is_sign_negative() {
                return Err(DomainError::validation("gst cannot be negative"));
            }
        }
        if let Some(freight) = self.freight {
            if freight < Money::ZERO {
                return Err(DomainError::validation("freight cannot be negative"));
            }
        }

        Ok(Sale {
            id,
            scope: self.scope,
            firm_name,
            bill_to: optional_text(self.bill_to),
            date: self.date,
            weight,
            rate,
            amount,
            gst: self.gst,
            freight: self.freight,
            vehicle_no: optional_text(self.vehicle_no),
            payment_type: optional_text(self.payment_type),
            created_at,
        })
    }
}

/// Money received from a buying firm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePayment {
    pub id: SalePaymentId,
    pub scope: Scope,
    pub firm_name: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Entity for SalePayment {
    type Id = SalePaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSalePayment {
    pub scope: Scope,
    pub firm_name: String,
    pub amount: Money,
    pub date: NaiveDate,
}

impl NewSalePayment {
    pub fn into_payment(
        self,
        id: SalePaymentId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<SalePayment> {
        Ok(SalePayment {
            id,
            scope: self.scope,
            firm_name: required_text(self.firm_name, "firm_name")?,
            amount: self.amount.ensure_positive("amount")?,
            date: self.date,
            created_at,
        })
    }
}

fn required_text(value: String, field: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;
    use proptest::prelude::*;
    use scrapyard_core::{CompanyId, GodownId};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn new_sale(weight: &str, rate: &str) -> NewSale {
        NewSale {
            scope: Scope::new(CompanyId::new(), GodownId::new()),
            firm_name: " Shree Metals ".to_string(),
            bill_to: Some("  ".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 2, 14).unwrap(),
            weight: Weight::new(dec(weight)),
            rate: Rate::new(dec(rate)),
            gst: Some(dec("18")),
            freight: Some(Money::new(dec("1500"))),
            vehicle_no: Some("MH12AB1234".to_string()),
            payment_type: Some("credit".to_string()),
        }
    }

    #[test]
    fn amount_is_weight_times_rate() {
        let sale = new_sale("1250.5", "31.2").into_sale(SaleId::new(), Utc::now()).unwrap();
        assert_eq!(sale.amount, Money::new(dec("39015.60")));
        assert_eq!(sale.firm_name, "Shree Metals");
        assert_eq!(sale.bill_to, None);
        assert_eq!(sale.vehicle_no.as_deref(), Some("MH12AB1234"));
    }

    #[test]
    fn zero_weight_is_rejected() {
        let err = new_sale("0", "31.2").into_sale(SaleId::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn overflowing_amount_is_rejected() {
        let mut req = new_sale("1", "1000");
        req.weight = Weight::new(Decimal::MAX);
        let err = req.into_sale(SaleId::new(), Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::validation("amount out of range"));
    }

    #[test]
    fn payment_requires_firm_and_positive_amount() {
        let scope = Scope::new(CompanyId::new(), GodownId::new());
        let date = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();

        let missing_firm = NewSalePayment {
            scope,
            firm_name: String::new(),
            amount: Money::new(dec("100")),
            date,
        };
        assert!(missing_firm.into_payment(SalePaymentId::new(), Utc::now()).is_err());

        let negative = NewSalePayment {
            scope,
            firm_name: "Shree Metals".to_string(),
            amount: Money::new(dec("-1")),
            date,
        };
        assert!(negative.into_payment(SalePaymentId::new(), Utc::now()).is_err());
    }

    proptest! {
        #[test]
        fn sale_amount_has_no_rounding_drift(
            weight_milli in 1i64..10_000_000i64,
            rate_paise in 1i64..1_000_000i64,
        ) {
            let mut req = new_sale("1", "1");
            req.weight = Weight::new(Decimal::new(weight_milli, 3));
            req.rate = Rate::new(Decimal::new(rate_paise, 2));
            let sale = req.into_sale(SaleId::new(), Utc::now()).unwrap();
            prop_assert_eq!(
                sale.amount.value(),
                Decimal::new(weight_milli, 3) * Decimal::new(rate_paise, 2)
            );
        }
    }
}
