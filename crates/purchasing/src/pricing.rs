use scrapyard_core::{DomainResult, Money, Weight};

use crate::rate::RateAgreement;

/// Outcome of pricing one weighed line against a rate agreement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub material: String,
    pub weight: Weight,
    pub rate: scrapyard_core::Rate,
    pub amount: Money,
}

/// Price `weight` at the agreed rate and add the amount to `total`.
///
/// `total` is left untouched when pricing fails.
pub fn price_line(
    agreement: &RateAgreement,
    weight: Weight,
    total: &mut Money,
) -> DomainResult<PricedLine> {
    let weight = weight.ensure_positive("weight")?;
    let rate = agreement.ensure_usable()?;
    let amount = weight.checked_mul(rate)?;
    *total = total.checked_add(amount)?;

    Ok(PricedLine {
        material: agreement.material.clone(),
        weight,
        rate,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use scrapyard_core::{Rate, ScrapTypeId, VendorId};

    fn agreement(rate: &str) -> RateAgreement {
        RateAgreement::new(
            VendorId::new(),
            ScrapTypeId::new(),
            Rate::new(Decimal::from_str(rate).unwrap()),
            "Copper",
        )
    }

    #[test]
    fn amount_is_weight_times_rate() {
        let mut total = Money::ZERO;
        let line = price_line(&agreement("10"), Weight::new(Decimal::from(5)), &mut total).unwrap();
        assert_eq!(line.amount, Money::new(Decimal::from(50)));
        assert_eq!(line.material, "Copper");
        assert_eq!(total, Money::new(Decimal::from(50)));
    }

    #[test]
    fn accumulates_across_lines() {
        let mut total = Money::ZERO;
        price_line(&agreement("12.5"), Weight::new(Decimal::from(2)), &mut total).unwrap();
        price_line(&agreement("0.35"), Weight::new(Decimal::from_str("3.3").unwrap()), &mut total)
            .unwrap();
        assert_eq!(total, Money::new(Decimal::from_str("26.155").unwrap()));
    }

    #[test]
    fn zero_weight_is_rejected_and_total_unchanged() {
        let mut total = Money::new(Decimal::from(7));
        assert!(price_line(&agreement("10"), Weight::ZERO, &mut total).is_err());
        assert_eq!(total, Money::new(Decimal::from(7)));
    }

    #[test]
    fn zero_rate_is_rejected() {
        let mut total = Money::ZERO;
        assert!(price_line(&agreement("0"), Weight::new(Decimal::ONE), &mut total).is_err());
        assert_eq!(total, Money::ZERO);
    }

    #[test]
    fn overflowing_amount_is_rejected_and_total_unchanged() {
        let mut total = Money::new(Decimal::from(7));
        let err = price_line(&agreement("10"), Weight::new(Decimal::MAX), &mut total).unwrap_err();
        assert!(matches!(err, scrapyard_core::DomainError::Validation(_)));
        assert_eq!(total, Money::new(Decimal::from(7)));
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let mut total = Money::new(Decimal::MAX);
        assert!(price_line(&agreement("1"), Weight::new(Decimal::ONE), &mut total).is_err());
        assert_eq!(total, Money::new(Decimal::MAX));
    }

    proptest! {
        /// Property: every line amount equals weight * rate exactly, and the
        /// accumulated total equals the sum of the line amounts.
        #[test]
        fn total_equals_sum_of_exact_line_amounts(
            lines in prop::collection::vec((1i64..500_000i64, 1i64..100_000i64), 1..20)
        ) {
            let mut total = Money::ZERO;
            let mut amounts = Vec::new();

            for (weight_milli, rate_paise) in lines {
                // Weights in grams (3 dp) and rates in paise (2 dp).
                let weight = Weight::new(Decimal::new(weight_milli, 3));
                let rate = Decimal::new(rate_paise, 2);
                let mut agreement = agreement("1");
                agreement.rate = Rate::new(rate);

                let line = price_line(&agreement, weight, &mut total).unwrap();
                prop_assert_eq!(line.amount.value(), weight.value() * rate);
                amounts.push(line.amount);
            }

            let sum: Money = amounts.iter().sum();
            prop_assert_eq!(total, sum);
        }
    }
}
