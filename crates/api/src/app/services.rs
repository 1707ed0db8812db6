use std::sync::Arc;

use chrono::NaiveDate;

use scrapyard_accounting::{Expense, ExpenseSummary, NewExpense};
use scrapyard_core::Scope;
use scrapyard_infra::store::{
    ExpenseView, FeriwalaRecordView, InMemoryStore, KabadiwalaOwnerEntry, KabadiwalaSummaryView,
    PgStore, Store, StoreError,
};
use scrapyard_infra::{
    BackOffice, BackOfficeError, PurchaseAborted, PurchaseReceipt, PurchaseWorkflow,
};
use scrapyard_labour::{AttendanceRecord, MarkAttendance};
use scrapyard_parties::Labourer;
use scrapyard_purchasing::NewPurchase;
use scrapyard_sales::{NewSale, NewSalePayment, Sale, SalePayment};

use crate::config::DatabaseConfig;

/// Workflows and reads wired to one concrete store.
#[derive(Clone)]
pub enum AppServices {
    InMemory {
        store: Arc<InMemoryStore>,
        purchases: PurchaseWorkflow<Arc<InMemoryStore>>,
        back_office: BackOffice<Arc<InMemoryStore>>,
    },
    Postgres {
        store: Arc<PgStore>,
        purchases: PurchaseWorkflow<Arc<PgStore>>,
        back_office: BackOffice<Arc<PgStore>>,
    },
}

macro_rules! with_services {
    ($self:expr, |$store:ident, $purchases:ident, $back_office:ident| $body:expr) => {
        match $self {
            AppServices::InMemory {
                store: $store,
                purchases: $purchases,
                back_office: $back_office,
            } => $body,
            AppServices::Postgres {
                store: $store,
                purchases: $purchases,
                back_office: $back_office,
            } => $body,
        }
    };
}

impl AppServices {
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        AppServices::InMemory {
            purchases: PurchaseWorkflow::new(store.clone()),
            back_office: BackOffice::new(store.clone()),
            store,
        }
    }

    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        AppServices::Postgres {
            purchases: PurchaseWorkflow::new(store.clone()),
            back_office: BackOffice::new(store.clone()),
            store,
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            AppServices::InMemory { .. } => "in_memory",
            AppServices::Postgres { .. } => "postgres",
        }
    }

    pub async fn record_purchase(
        &self,
        request: NewPurchase,
    ) -> Result<PurchaseReceipt, PurchaseAborted> {
        with_services!(self, |_store, purchases, _office| purchases.record(request).await)
    }

    pub async fn add_sale(&self, request: NewSale) -> Result<Sale, BackOfficeError> {
        with_services!(self, |_store, _purchases, office| office.add_sale(request).await)
    }

    pub async fn add_sale_payment(
        &self,
        request: NewSalePayment,
    ) -> Result<SalePayment, BackOfficeError> {
        with_services!(self, |_store, _purchases, office| office
            .add_sale_payment(request)
            .await)
    }

    pub async fn mark_attendance(
        &self,
        request: MarkAttendance,
    ) -> Result<AttendanceRecord, BackOfficeError> {
        with_services!(self, |_store, _purchases, office| office
            .mark_attendance(request)
            .await)
    }

    pub async fn add_expense(&self, request: NewExpense) -> Result<Expense, BackOfficeError> {
        with_services!(self, |_store, _purchases, office| office.add_expense(request).await)
    }

    pub async fn list_feriwala(
        &self,
        scope: Scope,
        up_to: Option<NaiveDate>,
    ) -> Result<Vec<FeriwalaRecordView>, StoreError> {
        with_services!(self, |store, _purchases, _office| store
            .list_feriwala(scope, up_to)
            .await)
    }

    pub async fn list_kabadiwala(
        &self,
        scope: Scope,
    ) -> Result<Vec<KabadiwalaSummaryView>, StoreError> {
        with_services!(self, |store, _purchases, _office| store.list_kabadiwala(scope).await)
    }

    pub async fn kabadiwala_owner_entries(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<KabadiwalaOwnerEntry>, StoreError> {
        with_services!(self, |store, _purchases, _office| store
            .kabadiwala_owner_entries(scope, on)
            .await)
    }

    pub async fn list_sales(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<Sale>, StoreError> {
        with_services!(self, |store, _purchases, _office| store.list_sales(scope, on).await)
    }

    pub async fn list_sale_payments(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<SalePayment>, StoreError> {
        with_services!(self, |store, _purchases, _office| store
            .list_sale_payments(scope, on)
            .await)
    }

    pub async fn list_labour(&self, scope: Scope) -> Result<Vec<Labourer>, StoreError> {
        with_services!(self, |store, _purchases, _office| store.list_labour(scope).await)
    }

    pub async fn attendance_on(
        &self,
        scope: Scope,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        with_services!(self, |store, _purchases, _office| store
            .attendance_on(scope, date)
            .await)
    }

    pub async fn list_expenses(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<ExpenseView>, StoreError> {
        with_services!(self, |store, _purchases, _office| store.list_expenses(scope, on).await)
    }

    pub async fn expense_summary(
        &self,
        scope: Scope,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ExpenseSummary, StoreError> {
        with_services!(self, |store, _purchases, _office| store
            .expense_summary(scope, start, end)
            .await)
    }
}

/// Wire services for the configured backend: Postgres when a database is
/// configured, in-memory otherwise.
pub async fn build_services(database: Option<&DatabaseConfig>) -> Result<AppServices, StoreError> {
    let Some(db) = database else {
        tracing::warn!(
            "DATABASE_URL not set; using an empty in-memory store. No vendors, rates, \
             accounts or labourers are seeded, so purchases fail with \"Vendor not found\" \
             and lists stay empty. Data is lost on exit"
        );
        return Ok(AppServices::in_memory(Arc::new(InMemoryStore::new())));
    };

    let store = PgStore::connect(&db.url, db.max_connections).await?;
    if db.run_migrations {
        store.migrate().await?;
        tracing::info!("schema migrations applied");
    }
    Ok(AppServices::postgres(store))
}
