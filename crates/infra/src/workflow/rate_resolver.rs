use scrapyard_core::{ScrapTypeId, VendorId};
use scrapyard_purchasing::RateAgreement;

use crate::store::StoreTx;

use super::WorkflowError;

/// Look up the agreed rate and material label for one `(vendor, scrap type)` pair.
///
/// A missing agreement is `RateNotFound`; the caller aborts the whole purchase.
pub async fn resolve_rate<T: StoreTx>(
    tx: &mut T,
    vendor_id: VendorId,
    scrap_type_id: ScrapTypeId,
) -> Result<RateAgreement, WorkflowError> {
    tx.rate_agreement(vendor_id, scrap_type_id)
        .await?
        .ok_or(WorkflowError::RateNotFound {
            vendor_id,
            scrap_type_id,
        })
}
