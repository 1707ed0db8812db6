//! Purchasing domain module: buying scrap from feriwalas and kabadiwalas.
//!
//! This crate contains the business rules for pricing and recording purchases,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod payment;
pub mod pricing;
pub mod purchase;
pub mod rate;

pub use payment::{PaymentMode, PaymentRecord, PaymentStatus, PaymentTerms};
pub use pricing::{PricedLine, price_line};
pub use purchase::{
    LineRequest, NewPurchase, PurchaseDraft, PurchaseHeader, PurchaseKind, PurchaseLine,
    Settlement, SettlementOutcome,
};
pub use rate::RateAgreement;
