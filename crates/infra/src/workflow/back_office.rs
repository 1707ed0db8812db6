//! Single-row writes for sales, labour and the expense book.
//!
//! Each operation opens its own scope, writes one row and commits. Only an
//! expense paid from a funding account touches the ledger, in that same scope.

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use scrapyard_accounting::{Expense, NewExpense};
use scrapyard_core::{DomainError, ExpenseId, SaleId, SalePaymentId};
use scrapyard_labour::{AttendanceRecord, MarkAttendance};
use scrapyard_sales::{NewSale, NewSalePayment, Sale, SalePayment};

use crate::store::{Store, StoreError, StoreTx};

use super::{WorkflowError, post_ledger_entry};

#[derive(Debug, Error)]
pub enum BackOfficeError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl From<DomainError> for BackOfficeError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound(what) => BackOfficeError::NotFound(what),
            DomainError::Validation(msg)
            | DomainError::InvalidId(msg)
            | DomainError::InvariantViolation(msg) => BackOfficeError::Validation(msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackOffice<S> {
    store: S,
}

impl<S: Store> BackOffice<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record an outgoing sale; the amount is `weight * rate`.
    #[instrument(skip(self, request), fields(company_id = %request.scope.company_id, godown_id = %request.scope.godown_id))]
    pub async fn add_sale(&self, request: NewSale) -> Result<Sale, BackOfficeError> {
        let sale = request.into_sale(SaleId::new(), Utc::now())?;

        let mut tx = self.store.begin().await?;
        if let Err(e) = tx.insert_sale(&sale).await {
            rollback(tx).await;
            return Err(e.into());
        }
        tx.commit().await?;

        info!(sale_id = %sale.id, amount = %sale.amount, "sale recorded");
        Ok(sale)
    }

    #[instrument(skip(self, request), fields(company_id = %request.scope.company_id, godown_id = %request.scope.godown_id))]
    pub async fn add_sale_payment(
        &self,
        request: NewSalePayment,
    ) -> Result<SalePayment, BackOfficeError> {
        let payment = request.into_payment(SalePaymentId::new(), Utc::now())?;

        let mut tx = self.store.begin().await?;
        if let Err(e) = tx.insert_sale_payment(&payment).await {
            rollback(tx).await;
            return Err(e.into());
        }
        tx.commit().await?;

        info!(payment_id = %payment.id, amount = %payment.amount, "sale payment recorded");
        Ok(payment)
    }

    /// Mark a labourer present or absent; a second mark for the same date replaces the first.
    #[instrument(skip(self, request), fields(labour_id = %request.labour_id, date = %request.date))]
    pub async fn mark_attendance(
        &self,
        request: MarkAttendance,
    ) -> Result<AttendanceRecord, BackOfficeError> {
        let mut tx = self.store.begin().await?;

        let labourer = match tx.labourer(request.labour_id).await {
            Ok(Some(labourer)) => labourer,
            Ok(None) => {
                rollback(tx).await;
                return Err(BackOfficeError::NotFound(format!("labour {}", request.labour_id)));
            }
            Err(e) => {
                rollback(tx).await;
                return Err(e.into());
            }
        };

        let record = match request.into_record(&labourer, Utc::now()) {
            Ok(record) => record,
            Err(e) => {
                rollback(tx).await;
                return Err(e.into());
            }
        };

        if let Err(e) = tx.upsert_attendance(&record).await {
            rollback(tx).await;
            return Err(e.into());
        }
        tx.commit().await?;

        info!(status = record.status.as_str(), "attendance marked");
        Ok(record)
    }

    /// Record a godown expense; with an account named, its balance is debited too.
    #[instrument(skip(self, request), fields(company_id = %request.scope.company_id, godown_id = %request.scope.godown_id))]
    pub async fn add_expense(&self, request: NewExpense) -> Result<Expense, BackOfficeError> {
        let now = Utc::now();
        let expense = request.into_expense(ExpenseId::new(), now)?;
        let posting = expense.ledger_posting()?;

        let mut tx = self.store.begin().await?;
        if let Err(e) = tx.insert_expense(&expense).await {
            rollback(tx).await;
            return Err(e.into());
        }
        if let Some(posting) = posting {
            if let Err(e) = post_ledger_entry(&mut tx, posting, now).await {
                rollback(tx).await;
                return Err(e.into());
            }
        }
        tx.commit().await?;

        info!(expense_id = %expense.id, amount = %expense.amount, mode = %expense.payment_mode, "expense recorded");
        Ok(expense)
    }
}

impl From<WorkflowError> for BackOfficeError {
    fn from(value: WorkflowError) -> Self {
        match value {
            WorkflowError::AccountNotFound(id) => BackOfficeError::NotFound(format!("account {id}")),
            WorkflowError::Storage(e) => BackOfficeError::Storage(e),
            other => BackOfficeError::Validation(other.to_string()),
        }
    }
}

async fn rollback<T: StoreTx>(tx: T) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "rollback failed");
    }
}
