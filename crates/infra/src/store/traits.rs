use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

use scrapyard_accounting::{Expense, ExpenseSummary, LedgerEntry};
use scrapyard_core::{AccountId, LabourId, Money, PurchaseId, Scope, ScrapTypeId, VendorId};
use scrapyard_labour::AttendanceRecord;
use scrapyard_parties::{Labourer, Vendor};
use scrapyard_purchasing::{
    PaymentRecord, PaymentStatus, PurchaseHeader, PurchaseKind, PurchaseLine, RateAgreement,
};
use scrapyard_sales::{Sale, SalePayment};

use super::views::{
    ExpenseView, FeriwalaRecordView, KabadiwalaOwnerEntry, KabadiwalaSummaryView,
};

/// Storage operation error.
///
/// These are **infrastructure errors** as opposed to domain errors: the
/// caller cannot fix them by changing the request, only by retrying it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable ({op}): {message}")]
    Unavailable { op: &'static str, message: String },

    #[error("query failed ({op}): {message}")]
    Query { op: &'static str, message: String },

    #[error("write conflict ({op}): {message}")]
    Conflict { op: &'static str, message: String },

    #[error("unreadable row ({op}): {message}")]
    Corrupt { op: &'static str, message: String },
}

impl StoreError {
    pub fn query(op: &'static str, message: impl Into<String>) -> Self {
        Self::Query {
            op,
            message: message.into(),
        }
    }

    pub fn corrupt(op: &'static str, message: impl Into<String>) -> Self {
        Self::Corrupt {
            op,
            message: message.into(),
        }
    }
}

/// Transactional storage provider.
///
/// Every write goes through a [`StoreTx`] obtained from [`Store::begin`]. Reads
/// outside a scope only ever observe committed data.
///
/// Implementations must:
/// - filter every scoped read by company and godown
/// - make a scope's writes visible to others only once it commits
/// - discard all of a scope's writes on rollback or drop
#[async_trait]
pub trait Store: Send + Sync {
    type Tx: StoreTx;

    /// Open a transactional scope.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Feriwala purchases dated on or before `up_to` (all when `None`), newest first.
    async fn list_feriwala(
        &self,
        scope: Scope,
        up_to: Option<NaiveDate>,
    ) -> Result<Vec<FeriwalaRecordView>, StoreError>;

    /// Kabadiwala purchases with line and payment aggregates, newest first.
    async fn list_kabadiwala(&self, scope: Scope)
    -> Result<Vec<KabadiwalaSummaryView>, StoreError>;

    /// Kabadiwala lines flattened with their purchase, for one date or all.
    async fn kabadiwala_owner_entries(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<KabadiwalaOwnerEntry>, StoreError>;

    async fn list_sales(&self, scope: Scope, on: Option<NaiveDate>)
    -> Result<Vec<Sale>, StoreError>;

    async fn list_sale_payments(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<SalePayment>, StoreError>;

    async fn list_labour(&self, scope: Scope) -> Result<Vec<Labourer>, StoreError>;

    async fn attendance_on(
        &self,
        scope: Scope,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Expenses for one date or all, newest first.
    async fn list_expenses(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<ExpenseView>, StoreError>;

    /// Expense totals for `start..=end`; an open bound does not filter.
    async fn expense_summary(
        &self,
        scope: Scope,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ExpenseSummary, StoreError>;

    async fn account_balance(&self, account_id: AccountId) -> Result<Option<Money>, StoreError>;
}

/// One open transactional scope.
///
/// `commit` and `rollback` consume the scope. Dropping a scope without
/// committing it rolls it back.
#[async_trait]
pub trait StoreTx: Send {
    async fn vendor(&mut self, vendor_id: VendorId) -> Result<Option<Vendor>, StoreError>;

    async fn rate_agreement(
        &mut self,
        vendor_id: VendorId,
        scrap_type_id: ScrapTypeId,
    ) -> Result<Option<RateAgreement>, StoreError>;

    async fn insert_purchase_header(&mut self, header: &PurchaseHeader) -> Result<(), StoreError>;

    async fn insert_purchase_line(
        &mut self,
        kind: PurchaseKind,
        line: &PurchaseLine,
    ) -> Result<(), StoreError>;

    async fn update_purchase_total(
        &mut self,
        kind: PurchaseKind,
        purchase_id: PurchaseId,
        total: Money,
    ) -> Result<(), StoreError>;

    async fn update_payment_status(
        &mut self,
        purchase_id: PurchaseId,
        status: PaymentStatus,
    ) -> Result<(), StoreError>;

    async fn insert_payment(&mut self, payment: &PaymentRecord) -> Result<(), StoreError>;

    async fn insert_ledger_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError>;

    /// Atomically add `delta` to the account balance.
    ///
    /// Returns `false` when the account does not exist.
    async fn adjust_account_balance(
        &mut self,
        account_id: AccountId,
        delta: Money,
    ) -> Result<bool, StoreError>;

    async fn insert_sale(&mut self, sale: &Sale) -> Result<(), StoreError>;

    async fn insert_sale_payment(&mut self, payment: &SalePayment) -> Result<(), StoreError>;

    async fn labourer(&mut self, labour_id: LabourId) -> Result<Option<Labourer>, StoreError>;

    /// Insert or replace the record for `(labour_id, date)`.
    async fn upsert_attendance(&mut self, record: &AttendanceRecord) -> Result<(), StoreError>;

    async fn insert_expense(&mut self, expense: &Expense) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> Store for Arc<S>
where
    S: Store,
{
    type Tx = S::Tx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        (**self).begin().await
    }

    async fn list_feriwala(
        &self,
        scope: Scope,
        up_to: Option<NaiveDate>,
    ) -> Result<Vec<FeriwalaRecordView>, StoreError> {
        (**self).list_feriwala(scope, up_to).await
    }

    async fn list_kabadiwala(
        &self,
        scope: Scope,
    ) -> Result<Vec<KabadiwalaSummaryView>, StoreError> {
        (**self).list_kabadiwala(scope).await
    }

    async fn kabadiwala_owner_entries(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<KabadiwalaOwnerEntry>, StoreError> {
        (**self).kabadiwala_owner_entries(scope, on).await
    }

    async fn list_sales(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<Sale>, StoreError> {
        (**self).list_sales(scope, on).await
    }

    async fn list_sale_payments(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<SalePayment>, StoreError> {
        (**self).list_sale_payments(scope, on).await
    }

    async fn list_labour(&self, scope: Scope) -> Result<Vec<Labourer>, StoreError> {
        (**self).list_labour(scope).await
    }

    async fn attendance_on(
        &self,
        scope: Scope,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        (**self).attendance_on(scope, date).await
    }

    async fn list_expenses(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<ExpenseView>, StoreError> {
        (**self).list_expenses(scope, on).await
    }

    async fn expense_summary(
        &self,
        scope: Scope,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ExpenseSummary, StoreError> {
        (**self).expense_summary(scope, start, end).await
    }

    async fn account_balance(&self, account_id: AccountId) -> Result<Option<Money>, StoreError> {
        (**self).account_balance(account_id).await
    }
}
