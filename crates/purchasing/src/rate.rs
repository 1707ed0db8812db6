use serde::{Deserialize, Serialize};

use scrapyard_core::{DomainResult, Rate, ScrapTypeId, VendorId};

/// Standing price a vendor has agreed for one scrap type.
///
/// At most one agreement exists per `(vendor_id, scrap_type_id)`; the material
/// label comes from the scrap type catalog and is what purchase lines record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateAgreement {
    pub vendor_id: VendorId,
    pub scrap_type_id: ScrapTypeId,
    pub rate: Rate,
    pub material: String,
}

impl RateAgreement {
    pub fn new(
        vendor_id: VendorId,
        scrap_type_id: ScrapTypeId,
        rate: Rate,
        material: impl Into<String>,
    ) -> Self {
        Self {
            vendor_id,
            scrap_type_id,
            rate,
            material: material.into(),
        }
    }

    /// An agreement can only price lines if its rate is positive.
    ///
    /// Rates are master data and are not validated on the way in, so a zero or
    /// negative rate on file is reported here instead of producing a zero or
    /// negative line amount.
    pub fn ensure_usable(&self) -> DomainResult<Rate> {
        self.rate
            .ensure_positive(&format!("rate for scrap_type_id {}", self.scrap_type_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn negative_rate_is_not_usable() {
        let agreement = RateAgreement::new(
            VendorId::new(),
            ScrapTypeId::new(),
            Rate::new(Decimal::from(-3)),
            "Iron",
        );
        let err = agreement.ensure_usable().unwrap_err();
        assert!(err.to_string().contains("rate for scrap_type_id"));
    }
}
