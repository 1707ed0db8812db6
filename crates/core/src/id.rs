//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_newtype!(
    /// Owning company (top-level tenant boundary).
    CompanyId,
    "CompanyId"
);
uuid_newtype!(
    /// Godown (yard/warehouse) within a company.
    GodownId,
    "GodownId"
);
uuid_newtype!(VendorId, "VendorId");
uuid_newtype!(
    /// Catalog entry for a scrap material (e.g. "Iron", "Copper wire").
    ScrapTypeId,
    "ScrapTypeId"
);
uuid_newtype!(
    /// Funding account (cash box, bank account) that purchases are paid from.
    AccountId,
    "AccountId"
);
uuid_newtype!(PurchaseId, "PurchaseId");
uuid_newtype!(PurchaseLineId, "PurchaseLineId");
uuid_newtype!(PaymentId, "PaymentId");
uuid_newtype!(LedgerEntryId, "LedgerEntryId");
uuid_newtype!(SaleId, "SaleId");
uuid_newtype!(SalePaymentId, "SalePaymentId");
uuid_newtype!(LabourId, "LabourId");
uuid_newtype!(
    /// Godown running cost (diesel, tea, repairs) entered by the manager.
    ExpenseId,
    "ExpenseId"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_display() {
        let id = VendorId::new();
        let parsed: VendorId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_failure_names_the_identifier() {
        let err = "not-a-uuid".parse::<ScrapTypeId>().unwrap_err();
        match err {
            DomainError::InvalidId(msg) => assert!(msg.starts_with("ScrapTypeId")),
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }
}
