//! Read projections served straight from storage.
//!
//! These are plain query results: no write semantics, no invariants beyond
//! what the committed rows already satisfy.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use scrapyard_core::{
    AccountId, CompanyId, ExpenseId, GodownId, Money, PurchaseId, Rate, VendorId, Weight,
};
use scrapyard_purchasing::{PaymentMode, PaymentStatus};

/// One priced line as shown next to its purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseLineView {
    pub material_name: String,
    pub weight: Weight,
    pub rate: Rate,
    pub amount: Money,
}

/// Feriwala purchase with its lines and vendor name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeriwalaRecordView {
    pub id: PurchaseId,
    pub date: NaiveDate,
    pub company_id: CompanyId,
    pub godown_id: GodownId,
    pub vendor_id: VendorId,
    pub total_amount: Money,
    pub vendor_name: Option<String>,
    pub scraps: Vec<PurchaseLineView>,
}

/// Kabadiwala purchase with line and payment aggregates (manager view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KabadiwalaSummaryView {
    pub id: PurchaseId,
    pub company_id: CompanyId,
    pub godown_id: GodownId,
    pub vendor_id: VendorId,
    pub kabadiwala_name: String,
    pub date: NaiveDate,
    pub total_amount: Money,
    pub payment_mode: Option<PaymentMode>,
    pub payment_status: Option<PaymentStatus>,
    pub created_at: DateTime<Utc>,
    pub items_count: i64,
    pub total_weight: Weight,
    pub scrap_total: Money,
    pub total_paid: Money,
}

/// Flat kabadiwala line row (owner view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KabadiwalaOwnerEntry {
    pub date: NaiveDate,
    pub kabadi_name: String,
    pub material: String,
    pub weight: Weight,
    pub rate: Rate,
    pub amount: Money,
    pub payment_status: Option<PaymentStatus>,
}

/// Expense row for the daily book, with the funding account's name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseView {
    pub id: ExpenseId,
    pub date: NaiveDate,
    pub category: String,
    pub description: Option<String>,
    pub paid_to: Option<String>,
    pub payment_mode: String,
    pub amount: Money,
    pub account_id: Option<AccountId>,
    pub account_name: Option<String>,
    pub created_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
