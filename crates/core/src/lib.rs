//! `scrapyard-core`: shared building blocks for the scrap trading back office.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the company/godown scope, decimal money and the domain error.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod scope;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    AccountId, CompanyId, ExpenseId, GodownId, LabourId, LedgerEntryId, PaymentId, PurchaseId,
    PurchaseLineId, SaleId, SalePaymentId, ScrapTypeId, VendorId,
};
pub use money::{Money, Rate, Weight};
pub use scope::Scope;
pub use value_object::ValueObject;
