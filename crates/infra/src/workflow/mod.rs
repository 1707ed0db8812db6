//! Application workflows over a [`Store`](crate::store::Store).
//!
//! ## Purchase flow
//!
//! ```text
//! NewPurchase
//!   ↓ validate (no scope opened yet)
//! Started
//!   ↓ vendor lookup                       VendorNotFound
//! VendorResolved
//!   ↓ resolve rate, price, insert line    RateNotFound
//! LinesPriced
//!   ↓ write total onto header
//! TotalFinalized
//!   ↓ classify payment (kabadiwala only)
//! PaymentClassified
//!   ↓ ledger entry + balance (paid > 0)   AccountNotFound
//! Ledgered
//!   ↓ commit
//! Committed
//! ```
//!
//! Any error rolls the scope back explicitly and is returned as
//! [`PurchaseAborted`] carrying the last stage reached.

pub mod back_office;
pub mod ledger_poster;
pub mod purchase;
pub mod rate_resolver;

use serde::Serialize;
use thiserror::Error;

use scrapyard_core::{AccountId, DomainError, ScrapTypeId, VendorId};

use crate::store::StoreError;

pub use back_office::{BackOffice, BackOfficeError};
pub use ledger_poster::post_ledger_entry;
pub use purchase::{PurchaseReceipt, PurchaseWorkflow};
pub use rate_resolver::resolve_rate;

/// Orchestrator progress. The last stage reached is reported on abort.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Started,
    VendorResolved,
    LinesPriced,
    TotalFinalized,
    PaymentClassified,
    Ledgered,
    Committed,
}

impl WorkflowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::VendorResolved => "vendor_resolved",
            Self::LinesPriced => "lines_priced",
            Self::TotalFinalized => "total_finalized",
            Self::PaymentClassified => "payment_classified",
            Self::Ledgered => "ledgered",
            Self::Committed => "committed",
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    #[error("Scrap items required")]
    EmptyLineSet,

    #[error("Vendor not found")]
    VendorNotFound(VendorId),

    #[error("Vendor does not have rate for this scrap_type_id: {scrap_type_id}")]
    RateNotFound {
        vendor_id: VendorId,
        scrap_type_id: ScrapTypeId,
    },

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// A domain rule the workflow itself should have upheld.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl From<DomainError> for WorkflowError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                WorkflowError::Validation(msg)
            }
            DomainError::InvariantViolation(msg) | DomainError::NotFound(msg) => {
                WorkflowError::InvariantViolation(msg)
            }
        }
    }
}

/// A purchase that did not commit. Nothing it wrote is visible.
#[derive(Debug, Error)]
#[error("purchase aborted after {}: {cause}", stage.as_str())]
pub struct PurchaseAborted {
    pub stage: WorkflowStage,
    #[source]
    pub cause: WorkflowError,
}

impl PurchaseAborted {
    pub fn at(stage: WorkflowStage, cause: impl Into<WorkflowError>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}
