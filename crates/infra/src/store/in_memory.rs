use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

use scrapyard_accounting::{Account, Expense, ExpenseSummary, LedgerEntry};
use scrapyard_core::{AccountId, LabourId, Money, PurchaseId, Scope, ScrapTypeId, VendorId};
use scrapyard_labour::AttendanceRecord;
use scrapyard_parties::{Labourer, Vendor};
use scrapyard_purchasing::{
    PaymentRecord, PaymentStatus, PurchaseHeader, PurchaseKind, PurchaseLine, RateAgreement,
};
use scrapyard_sales::{Sale, SalePayment};

use super::traits::{Store, StoreError, StoreTx};
use super::views::{
    ExpenseView, FeriwalaRecordView, KabadiwalaOwnerEntry, KabadiwalaSummaryView,
    PurchaseLineView,
};

/// Write step at which an [`InMemoryStore`] can be told to fail.
///
/// Used by tests to check that a failure part-way through a purchase leaves
/// nothing behind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailPoint {
    Begin,
    InsertHeader,
    InsertLine,
    UpdateTotal,
    UpdatePaymentStatus,
    InsertPayment,
    InsertLedgerEntry,
    AdjustBalance,
    InsertExpense,
    Commit,
}

impl FailPoint {
    fn op(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::InsertHeader => "insert_purchase_header",
            Self::InsertLine => "insert_purchase_line",
            Self::UpdateTotal => "update_purchase_total",
            Self::UpdatePaymentStatus => "update_payment_status",
            Self::InsertPayment => "insert_payment",
            Self::InsertLedgerEntry => "insert_ledger_entry",
            Self::AdjustBalance => "adjust_account_balance",
            Self::InsertExpense => "insert_expense",
            Self::Commit => "commit",
        }
    }
}

/// Every table the in-memory store keeps.
///
/// Rows are kept in insertion order so reads can break date ties the same way
/// Postgres does with `created_at`.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    pub vendors: HashMap<VendorId, Vendor>,
    pub rates: HashMap<(VendorId, ScrapTypeId), RateAgreement>,
    pub accounts: HashMap<AccountId, Account>,
    pub headers: Vec<PurchaseHeader>,
    pub lines: Vec<PurchaseLine>,
    pub payments: Vec<PaymentRecord>,
    pub ledger: Vec<LedgerEntry>,
    pub sales: Vec<Sale>,
    pub sale_payments: Vec<SalePayment>,
    pub labourers: HashMap<LabourId, Labourer>,
    pub attendance: Vec<AttendanceRecord>,
    pub expenses: Vec<Expense>,
}

impl MemoryDataset {
    fn header_mut(&mut self, purchase_id: PurchaseId) -> Option<&mut PurchaseHeader> {
        self.headers.iter_mut().find(|h| h.id == purchase_id)
    }

    fn lines_of(&self, purchase_id: PurchaseId) -> impl Iterator<Item = &PurchaseLine> {
        self.lines.iter().filter(move |l| l.purchase_id == purchase_id)
    }

    fn headers_in(&self, scope: Scope, kind: PurchaseKind) -> Vec<&PurchaseHeader> {
        let mut headers: Vec<&PurchaseHeader> = self
            .headers
            .iter()
            .filter(|h| h.scope == scope && h.kind == kind)
            .collect();
        headers.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        headers
    }

    fn expenses_in(&self, scope: Scope) -> impl Iterator<Item = &Expense> {
        self.expenses.iter().filter(move |e| e.scope == scope)
    }
}

/// In-memory [`Store`] for tests and database-less runs.
///
/// One mutex guards the whole dataset. A scope holds the lock for its whole
/// lifetime and works on a staged copy, so scopes are fully serialized and a
/// dropped scope leaves the dataset untouched.
///
/// Reads through [`Store`] also take the lock: calling them while a scope from
/// the same task is open deadlocks.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Arc<Mutex<MemoryDataset>>,
    fail_at: RwLock<Option<FailPoint>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_vendor(&self, vendor: Vendor) {
        let mut data = self.data.lock().await;
        data.vendors.insert(vendor.id_typed(), vendor);
    }

    pub async fn set_rate(&self, agreement: RateAgreement) {
        let mut data = self.data.lock().await;
        data.rates
            .insert((agreement.vendor_id, agreement.scrap_type_id), agreement);
    }

    pub async fn open_account(&self, account: Account) {
        let mut data = self.data.lock().await;
        data.accounts.insert(account.id, account);
    }

    pub async fn add_labourer(&self, labourer: Labourer) {
        let mut data = self.data.lock().await;
        data.labourers.insert(labourer.id_typed(), labourer);
    }

    /// Make every scope opened from now on fail at `point` (or never, with `None`).
    pub fn fail_at(&self, point: Option<FailPoint>) {
        if let Ok(mut slot) = self.fail_at.write() {
            *slot = point;
        }
    }

    /// Copy of the committed dataset.
    pub async fn snapshot(&self) -> MemoryDataset {
        self.data.lock().await.clone()
    }

    fn armed_fail_point(&self) -> Option<FailPoint> {
        self.fail_at.read().map(|slot| *slot).unwrap_or(None)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx, StoreError> {
        let fail_at = self.armed_fail_point();
        if fail_at == Some(FailPoint::Begin) {
            return Err(injected(FailPoint::Begin));
        }

        let guard = self.data.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryTx {
            guard,
            staged,
            fail_at,
        })
    }

    async fn list_feriwala(
        &self,
        scope: Scope,
        up_to: Option<NaiveDate>,
    ) -> Result<Vec<FeriwalaRecordView>, StoreError> {
        let data = self.data.lock().await;
        let records = data
            .headers_in(scope, PurchaseKind::Feriwala)
            .into_iter()
            .filter(|h| up_to.is_none_or(|limit| h.date <= limit))
            .map(|h| FeriwalaRecordView {
                id: h.id,
                date: h.date,
                company_id: h.scope.company_id,
                godown_id: h.scope.godown_id,
                vendor_id: h.vendor_id,
                total_amount: h.total_amount,
                vendor_name: data.vendors.get(&h.vendor_id).map(|v| v.name().to_string()),
                scraps: data
                    .lines_of(h.id)
                    .map(|l| PurchaseLineView {
                        material_name: l.material.clone(),
                        weight: l.weight,
                        rate: l.rate,
                        amount: l.amount,
                    })
                    .collect(),
            })
            .collect();
        Ok(records)
    }

    async fn list_kabadiwala(
        &self,
        scope: Scope,
    ) -> Result<Vec<KabadiwalaSummaryView>, StoreError> {
        let data = self.data.lock().await;
        let records = data
            .headers_in(scope, PurchaseKind::Kabadiwala)
            .into_iter()
            .map(|h| {
                let lines: Vec<&PurchaseLine> = data.lines_of(h.id).collect();
                KabadiwalaSummaryView {
                    id: h.id,
                    company_id: h.scope.company_id,
                    godown_id: h.scope.godown_id,
                    vendor_id: h.vendor_id,
                    kabadiwala_name: h.vendor_name.clone(),
                    date: h.date,
                    total_amount: h.total_amount,
                    payment_mode: h.payment_mode.clone(),
                    payment_status: h.payment_status,
                    created_at: h.created_at,
                    items_count: lines.len() as i64,
                    total_weight: lines.iter().map(|l| l.weight).sum(),
                    scrap_total: lines.iter().map(|l| l.amount).sum(),
                    total_paid: data
                        .payments
                        .iter()
                        .filter(|p| p.purchase_id == h.id)
                        .map(|p| p.amount)
                        .sum(),
                }
            })
            .collect();
        Ok(records)
    }

    async fn kabadiwala_owner_entries(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<KabadiwalaOwnerEntry>, StoreError> {
        let data = self.data.lock().await;
        let entries = data
            .headers_in(scope, PurchaseKind::Kabadiwala)
            .into_iter()
            .filter(|h| on.is_none_or(|date| h.date == date))
            .flat_map(|h| {
                data.lines_of(h.id).map(move |l| KabadiwalaOwnerEntry {
                    date: h.date,
                    kabadi_name: h.vendor_name.clone(),
                    material: l.material.clone(),
                    weight: l.weight,
                    rate: l.rate,
                    amount: l.amount,
                    payment_status: h.payment_status,
                })
            })
            .collect();
        Ok(entries)
    }

    async fn list_sales(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<Sale>, StoreError> {
        let data = self.data.lock().await;
        let mut sales: Vec<Sale> = data
            .sales
            .iter()
            .filter(|s| s.scope == scope && on.is_none_or(|date| s.date == date))
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(sales)
    }

    async fn list_sale_payments(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<SalePayment>, StoreError> {
        let data = self.data.lock().await;
        let mut payments: Vec<SalePayment> = data
            .sale_payments
            .iter()
            .filter(|p| p.scope == scope && on.is_none_or(|date| p.date == date))
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(payments)
    }

    async fn list_labour(&self, scope: Scope) -> Result<Vec<Labourer>, StoreError> {
        let data = self.data.lock().await;
        let mut labour: Vec<Labourer> = data
            .labourers
            .values()
            .filter(|l| l.scope() == scope)
            .cloned()
            .collect();
        labour.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(labour)
    }

    async fn attendance_on(
        &self,
        scope: Scope,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .attendance
            .iter()
            .filter(|a| a.scope == scope && a.date == date)
            .cloned()
            .collect())
    }

    async fn list_expenses(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<ExpenseView>, StoreError> {
        let data = self.data.lock().await;
        let mut expenses: Vec<&Expense> = data
            .expenses_in(scope)
            .filter(|e| on.is_none_or(|date| e.date == date))
            .collect();
        expenses.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(expenses
            .into_iter()
            .map(|e| ExpenseView {
                id: e.id,
                date: e.date,
                category: e.category.clone(),
                description: e.description.clone(),
                paid_to: e.paid_to.clone(),
                payment_mode: e.payment_mode.clone(),
                amount: e.amount,
                account_id: e.account_id,
                account_name: e
                    .account_id
                    .and_then(|id| data.accounts.get(&id))
                    .map(|a| a.name.clone()),
                created_by_name: e.created_by_name.clone(),
                created_at: e.created_at,
            })
            .collect())
    }

    async fn expense_summary(
        &self,
        scope: Scope,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ExpenseSummary, StoreError> {
        let data = self.data.lock().await;
        ExpenseSummary::tally(data.expenses_in(scope).filter(|e| {
            start.is_none_or(|from| e.date >= from) && end.is_none_or(|to| e.date <= to)
        }))
        .map_err(|e| StoreError::query("expense_summary", e.to_string()))
    }

    async fn account_balance(&self, account_id: AccountId) -> Result<Option<Money>, StoreError> {
        let data = self.data.lock().await;
        Ok(data.accounts.get(&account_id).map(|a| a.balance))
    }
}

/// Open scope over an [`InMemoryStore`].
pub struct InMemoryTx {
    guard: OwnedMutexGuard<MemoryDataset>,
    staged: MemoryDataset,
    fail_at: Option<FailPoint>,
}

impl InMemoryTx {
    fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        if self.fail_at == Some(point) {
            return Err(injected(point));
        }
        Ok(())
    }
}

fn injected(point: FailPoint) -> StoreError {
    StoreError::query(point.op(), "injected failure")
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn vendor(&mut self, vendor_id: VendorId) -> Result<Option<Vendor>, StoreError> {
        Ok(self.staged.vendors.get(&vendor_id).cloned())
    }

    async fn rate_agreement(
        &mut self,
        vendor_id: VendorId,
        scrap_type_id: ScrapTypeId,
    ) -> Result<Option<RateAgreement>, StoreError> {
        Ok(self.staged.rates.get(&(vendor_id, scrap_type_id)).cloned())
    }

    async fn insert_purchase_header(&mut self, header: &PurchaseHeader) -> Result<(), StoreError> {
        self.check(FailPoint::InsertHeader)?;
        if self.staged.headers.iter().any(|h| h.id == header.id) {
            return Err(StoreError::Conflict {
                op: "insert_purchase_header",
                message: format!("purchase {} already exists", header.id),
            });
        }
        self.staged.headers.push(header.clone());
        Ok(())
    }

    async fn insert_purchase_line(
        &mut self,
        kind: PurchaseKind,
        line: &PurchaseLine,
    ) -> Result<(), StoreError> {
        self.check(FailPoint::InsertLine)?;
        let parent_matches = self
            .staged
            .headers
            .iter()
            .any(|h| h.id == line.purchase_id && h.kind == kind);
        if !parent_matches {
            return Err(StoreError::query(
                "insert_purchase_line",
                format!("no {} purchase {}", kind.as_str(), line.purchase_id),
            ));
        }
        self.staged.lines.push(line.clone());
        Ok(())
    }

    async fn update_purchase_total(
        &mut self,
        kind: PurchaseKind,
        purchase_id: PurchaseId,
        total: Money,
    ) -> Result<(), StoreError> {
        self.check(FailPoint::UpdateTotal)?;
        match self.staged.header_mut(purchase_id) {
            Some(header) if header.kind == kind => {
                header.total_amount = total;
                Ok(())
            }
            _ => Err(StoreError::corrupt(
                "update_purchase_total",
                format!("no {} purchase {purchase_id}", kind.as_str()),
            )),
        }
    }

    async fn update_payment_status(
        &mut self,
        purchase_id: PurchaseId,
        status: PaymentStatus,
    ) -> Result<(), StoreError> {
        self.check(FailPoint::UpdatePaymentStatus)?;
        match self.staged.header_mut(purchase_id) {
            Some(header) if header.kind == PurchaseKind::Kabadiwala => {
                header.payment_status = Some(status);
                Ok(())
            }
            _ => Err(StoreError::corrupt(
                "update_payment_status",
                format!("no kabadiwala purchase {purchase_id}"),
            )),
        }
    }

    async fn insert_payment(&mut self, payment: &PaymentRecord) -> Result<(), StoreError> {
        self.check(FailPoint::InsertPayment)?;
        self.staged.payments.push(payment.clone());
        Ok(())
    }

    async fn insert_ledger_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError> {
        self.check(FailPoint::InsertLedgerEntry)?;
        self.staged.ledger.push(entry.clone());
        Ok(())
    }

    async fn adjust_account_balance(
        &mut self,
        account_id: AccountId,
        delta: Money,
    ) -> Result<bool, StoreError> {
        self.check(FailPoint::AdjustBalance)?;
        match self.staged.accounts.get_mut(&account_id) {
            Some(account) => {
                account.balance = account.balance.checked_add(delta).map_err(|e| {
                    StoreError::query(FailPoint::AdjustBalance.op(), e.to_string())
                })?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_sale(&mut self, sale: &Sale) -> Result<(), StoreError> {
        self.staged.sales.push(sale.clone());
        Ok(())
    }

    async fn insert_sale_payment(&mut self, payment: &SalePayment) -> Result<(), StoreError> {
        self.staged.sale_payments.push(payment.clone());
        Ok(())
    }

    async fn labourer(&mut self, labour_id: LabourId) -> Result<Option<Labourer>, StoreError> {
        Ok(self.staged.labourers.get(&labour_id).cloned())
    }

    async fn upsert_attendance(&mut self, record: &AttendanceRecord) -> Result<(), StoreError> {
        let existing = self
            .staged
            .attendance
            .iter_mut()
            .find(|a| a.labour_id == record.labour_id && a.date == record.date);
        match existing {
            Some(slot) => *slot = record.clone(),
            None => self.staged.attendance.push(record.clone()),
        }
        Ok(())
    }

    async fn insert_expense(&mut self, expense: &Expense) -> Result<(), StoreError> {
        self.check(FailPoint::InsertExpense)?;
        self.staged.expenses.push(expense.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.check(FailPoint::Commit)?;
        let InMemoryTx {
            mut guard, staged, ..
        } = self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn vendor() -> Vendor {
        Vendor::new(VendorId::new(), "Ramesh").unwrap()
    }

    #[tokio::test]
    async fn dropped_scope_leaves_dataset_untouched() {
        let store = InMemoryStore::new();
        let account = AccountId::new();
        store
            .open_account(Account::new(account, "Cash", Money::new(Decimal::from(100))))
            .await;

        {
            let mut tx = store.begin().await.unwrap();
            assert!(
                tx.adjust_account_balance(account, Money::new(Decimal::from(-40)))
                    .await
                    .unwrap()
            );
        }

        assert_eq!(
            store.account_balance(account).await.unwrap(),
            Some(Money::new(Decimal::from(100)))
        );
    }

    #[tokio::test]
    async fn committed_scope_becomes_visible() {
        let store = InMemoryStore::new();
        let account = AccountId::new();
        store
            .open_account(Account::new(account, "Cash", Money::new(Decimal::from(100))))
            .await;

        let mut tx = store.begin().await.unwrap();
        tx.adjust_account_balance(account, Money::new(Decimal::from(-40)))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(
            store.account_balance(account).await.unwrap(),
            Some(Money::new(Decimal::from(60)))
        );
    }

    #[tokio::test]
    async fn adjusting_unknown_account_reports_missing_row() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let touched = tx
            .adjust_account_balance(AccountId::new(), Money::new(Decimal::ONE))
            .await
            .unwrap();
        assert!(!touched);
    }

    #[tokio::test]
    async fn fail_point_fires_at_named_step() {
        let store = InMemoryStore::new();
        store.fail_at(Some(FailPoint::InsertLedgerEntry));
        let mut tx = store.begin().await.unwrap();
        assert!(tx.vendor(VendorId::new()).await.unwrap().is_none());

        let entry = scrapyard_accounting::LedgerPosting::debit(
            Scope::new(Default::default(), Default::default()),
            AccountId::new(),
            Money::new(Decimal::ONE),
            "feriwala purchase",
            "Purchase from Ramesh",
        )
        .unwrap()
        .into_entry(Default::default(), chrono::Utc::now());

        let err = tx.insert_ledger_entry(&entry).await.unwrap_err();
        assert!(err.to_string().contains("insert_ledger_entry"));
    }

    #[tokio::test]
    async fn attendance_upsert_replaces_same_day_record() {
        let store = InMemoryStore::new();
        let scope = Scope::new(Default::default(), Default::default());
        let labour_id = LabourId::new();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut record = AttendanceRecord {
            scope,
            labour_id,
            date,
            status: scrapyard_labour::AttendanceStatus::Present,
            marked_at: chrono::Utc::now(),
        };

        let mut tx = store.begin().await.unwrap();
        tx.upsert_attendance(&record).await.unwrap();
        record.status = scrapyard_labour::AttendanceStatus::Absent;
        tx.upsert_attendance(&record).await.unwrap();
        tx.commit().await.unwrap();

        let rows = store.attendance_on(scope, date).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, scrapyard_labour::AttendanceStatus::Absent);
    }

    #[tokio::test]
    async fn vendor_lookup_sees_seeded_master_data() {
        let store = InMemoryStore::new();
        let v = vendor();
        store.add_vendor(v.clone()).await;
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.vendor(v.id_typed()).await.unwrap(), Some(v));
    }
}
