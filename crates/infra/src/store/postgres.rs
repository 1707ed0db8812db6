//! Postgres-backed store.
//!
//! One sqlx transaction per [`StoreTx`] scope. Money, weight and rate columns
//! are `NUMERIC` and round-trip through `rust_decimal` without loss.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (serialization failure, deadlock) | `40001`, `40P01` | `Conflict` |
//! | Database (other) | any other | `Query` |
//! | PoolTimedOut, PoolClosed, Io, Tls | N/A | `Unavailable` |
//! | RowNotFound, ColumnDecode, ColumnNotFound, Decode | N/A | `Corrupt` |
//! | Other | N/A | `Query` |

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::HashMap;
use tracing::{Span, instrument};
use uuid::Uuid;

use scrapyard_accounting::{Expense, ExpenseSummary, LedgerEntry};
use scrapyard_core::{
    AccountId, LabourId, Money, PurchaseId, Rate, Scope, ScrapTypeId, VendorId, Weight,
};
use scrapyard_labour::{AttendanceRecord, AttendanceStatus};
use scrapyard_parties::{Labourer, Vendor};
use scrapyard_purchasing::{
    PaymentMode, PaymentRecord, PaymentStatus, PurchaseHeader, PurchaseKind, PurchaseLine,
    RateAgreement,
};
use scrapyard_sales::{Sale, SalePayment};

use super::traits::{Store, StoreError, StoreTx};
use super::views::{
    ExpenseView, FeriwalaRecordView, KabadiwalaOwnerEntry, KabadiwalaSummaryView,
    PurchaseLineView,
};

const SCHEMA: &str = include_str!("../../migrations/0001_scrapyard.sql");

/// Postgres [`Store`].
///
/// Every scoped query filters on both `company_id` and `godown_id`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    #[instrument(skip(database_url), err)]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables this store reads and writes. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    #[instrument(skip(self), err)]
    async fn begin(&self) -> Result<PgTx, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(PgTx { tx })
    }

    #[instrument(
        skip(self),
        fields(company_id = %scope.company_id, godown_id = %scope.godown_id, record_count),
        err
    )]
    async fn list_feriwala(
        &self,
        scope: Scope,
        up_to: Option<NaiveDate>,
    ) -> Result<Vec<FeriwalaRecordView>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT f.id, f.date, f.company_id, f.godown_id, f.vendor_id, f.total_amount,
                   v.name AS vendor_name
            FROM feriwala_records f
            LEFT JOIN vendors v ON v.id = f.vendor_id
            WHERE f.company_id = $1 AND f.godown_id = $2
              AND ($3::date IS NULL OR f.date <= $3)
            ORDER BY f.date DESC, f.created_at DESC
            "#,
        )
        .bind(scope.company_id.as_uuid())
        .bind(scope.godown_id.as_uuid())
        .bind(up_to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_feriwala", e))?;

        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_feriwala", e))?;

        let line_rows = sqlx::query(
            r#"
            SELECT feriwala_id, material, weight, rate, amount
            FROM feriwala_scraps
            WHERE feriwala_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_feriwala_scraps", e))?;

        let mut lines: HashMap<Uuid, Vec<PurchaseLineView>> = HashMap::new();
        for row in &line_rows {
            let parent: Uuid = row
                .try_get("feriwala_id")
                .map_err(|e| map_sqlx_error("list_feriwala_scraps", e))?;
            let view = line_view_from_row(row, "material")
                .map_err(|e| map_sqlx_error("list_feriwala_scraps", e))?;
            lines.entry(parent).or_default().push(view);
        }

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: Uuid = row.try_get("id").map_err(|e| map_sqlx_error("list_feriwala", e))?;
            let record = feriwala_from_row(row, lines.remove(&id).unwrap_or_default())
                .map_err(|e| map_sqlx_error("list_feriwala", e))?;
            records.push(record);
        }

        Span::current().record("record_count", records.len());
        Ok(records)
    }

    #[instrument(
        skip(self),
        fields(company_id = %scope.company_id, godown_id = %scope.godown_id),
        err
    )]
    async fn list_kabadiwala(
        &self,
        scope: Scope,
    ) -> Result<Vec<KabadiwalaSummaryView>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT k.id, k.company_id, k.godown_id, k.vendor_id, k.kabadiwala_name, k.date,
                   k.total_amount, k.payment_mode, k.payment_status, k.created_at,
                   COALESCE(s.items_count, 0) AS items_count,
                   COALESCE(s.total_weight, 0) AS total_weight,
                   COALESCE(s.scrap_total, 0) AS scrap_total,
                   COALESCE(p.total_paid, 0) AS total_paid
            FROM kabadiwala_records k
            LEFT JOIN (
                SELECT kabadiwala_id, COUNT(*) AS items_count,
                       SUM(weight) AS total_weight, SUM(amount) AS scrap_total
                FROM kabadiwala_scraps
                GROUP BY kabadiwala_id
            ) s ON s.kabadiwala_id = k.id
            LEFT JOIN (
                SELECT kabadiwala_id, SUM(amount) AS total_paid
                FROM kabadiwala_payments
                GROUP BY kabadiwala_id
            ) p ON p.kabadiwala_id = k.id
            WHERE k.company_id = $1 AND k.godown_id = $2
            ORDER BY k.date DESC, k.created_at DESC
            "#,
        )
        .bind(scope.company_id.as_uuid())
        .bind(scope.godown_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_kabadiwala", e))?;

        rows.iter()
            .map(|row| kabadiwala_summary_from_row(row).map_err(|e| map_sqlx_error("list_kabadiwala", e)))
            .collect()
    }

    #[instrument(
        skip(self),
        fields(company_id = %scope.company_id, godown_id = %scope.godown_id),
        err
    )]
    async fn kabadiwala_owner_entries(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<KabadiwalaOwnerEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT k.date, k.kabadiwala_name, s.material, s.weight, s.rate, s.amount,
                   k.payment_status
            FROM kabadiwala_scraps s
            JOIN kabadiwala_records k ON k.id = s.kabadiwala_id
            WHERE k.company_id = $1 AND k.godown_id = $2
              AND ($3::date IS NULL OR k.date = $3)
            ORDER BY k.date DESC, k.created_at DESC, s.id
            "#,
        )
        .bind(scope.company_id.as_uuid())
        .bind(scope.godown_id.as_uuid())
        .bind(on)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("kabadiwala_owner_entries", e))?;

        rows.iter()
            .map(|row| {
                owner_entry_from_row(row).map_err(|e| map_sqlx_error("kabadiwala_owner_entries", e))
            })
            .collect()
    }

    #[instrument(
        skip(self),
        fields(company_id = %scope.company_id, godown_id = %scope.godown_id),
        err
    )]
    async fn list_sales(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<Sale>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, company_id, godown_id, firm_name, bill_to, date, weight, rate, amount,
                   gst, freight, vehicle_no, payment_type, created_at
            FROM maal_out
            WHERE company_id = $1 AND godown_id = $2
              AND ($3::date IS NULL OR date = $3)
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(scope.company_id.as_uuid())
        .bind(scope.godown_id.as_uuid())
        .bind(on)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_sales", e))?;

        rows.iter()
            .map(|row| sale_from_row(row).map_err(|e| map_sqlx_error("list_sales", e)))
            .collect()
    }

    #[instrument(
        skip(self),
        fields(company_id = %scope.company_id, godown_id = %scope.godown_id),
        err
    )]
    async fn list_sale_payments(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<SalePayment>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, company_id, godown_id, firm_name, amount, date, created_at
            FROM maal_out_payments
            WHERE company_id = $1 AND godown_id = $2
              AND ($3::date IS NULL OR date = $3)
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(scope.company_id.as_uuid())
        .bind(scope.godown_id.as_uuid())
        .bind(on)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_sale_payments", e))?;

        rows.iter()
            .map(|row| {
                sale_payment_from_row(row).map_err(|e| map_sqlx_error("list_sale_payments", e))
            })
            .collect()
    }

    #[instrument(
        skip(self),
        fields(company_id = %scope.company_id, godown_id = %scope.godown_id),
        err
    )]
    async fn list_labour(&self, scope: Scope) -> Result<Vec<Labourer>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, company_id, godown_id, name, daily_wage
            FROM labour
            WHERE company_id = $1 AND godown_id = $2
            ORDER BY name
            "#,
        )
        .bind(scope.company_id.as_uuid())
        .bind(scope.godown_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_labour", e))?;

        rows.iter().map(|row| labourer_from_row(row, "list_labour")).collect()
    }

    #[instrument(
        skip(self),
        fields(company_id = %scope.company_id, godown_id = %scope.godown_id),
        err
    )]
    async fn attendance_on(
        &self,
        scope: Scope,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT company_id, godown_id, labour_id, date, status, marked_at
            FROM labour_attendance
            WHERE company_id = $1 AND godown_id = $2 AND date = $3
            "#,
        )
        .bind(scope.company_id.as_uuid())
        .bind(scope.godown_id.as_uuid())
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("attendance_on", e))?;

        rows.iter().map(attendance_from_row).collect()
    }

    #[instrument(
        skip(self),
        fields(company_id = %scope.company_id, godown_id = %scope.godown_id),
        err
    )]
    async fn list_expenses(
        &self,
        scope: Scope,
        on: Option<NaiveDate>,
    ) -> Result<Vec<ExpenseView>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT e.id, e.date, e.category, e.description, e.paid_to, e.payment_mode,
                   e.amount, e.account_id, a.name AS account_name, e.created_by_name,
                   e.created_at
            FROM expenses e
            LEFT JOIN accounts a ON a.id = e.account_id
            WHERE e.company_id = $1 AND e.godown_id = $2
              AND ($3::date IS NULL OR e.date = $3)
            ORDER BY e.date DESC, e.created_at DESC
            "#,
        )
        .bind(scope.company_id.as_uuid())
        .bind(scope.godown_id.as_uuid())
        .bind(on)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_expenses", e))?;

        rows.iter()
            .map(|row| expense_from_row(row).map_err(|e| map_sqlx_error("list_expenses", e)))
            .collect()
    }

    #[instrument(
        skip(self),
        fields(company_id = %scope.company_id, godown_id = %scope.godown_id),
        err
    )]
    async fn expense_summary(
        &self,
        scope: Scope,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ExpenseSummary, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount), 0) AS total_amount,
                   COALESCE(SUM(amount) FILTER (WHERE payment_mode = 'cash'), 0) AS total_cash,
                   COALESCE(SUM(amount) FILTER (WHERE payment_mode = 'upi'), 0) AS total_upi,
                   COALESCE(SUM(amount) FILTER (WHERE payment_mode LIKE 'bank%'), 0) AS total_bank
            FROM expenses
            WHERE company_id = $1 AND godown_id = $2
              AND ($3::date IS NULL OR date >= $3)
              AND ($4::date IS NULL OR date <= $4)
            "#,
        )
        .bind(scope.company_id.as_uuid())
        .bind(scope.godown_id.as_uuid())
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("expense_summary", e))?;

        let total = |column: &str| -> Result<Money, StoreError> {
            row.try_get::<Decimal, _>(column)
                .map(Money::new)
                .map_err(|e| map_sqlx_error("expense_summary", e))
        };
        Ok(ExpenseSummary {
            total_amount: total("total_amount")?,
            total_cash: total("total_cash")?,
            total_upi: total("total_upi")?,
            total_bank: total("total_bank")?,
        })
    }

    #[instrument(skip(self), err)]
    async fn account_balance(&self, account_id: AccountId) -> Result<Option<Money>, StoreError> {
        let balance: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM accounts WHERE id = $1")
                .bind(account_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("account_balance", e))?;
        Ok(balance.map(Money::new))
    }
}

/// Open scope over a [`PgStore`]; wraps one sqlx transaction.
///
/// Dropping it without `commit` lets sqlx roll the transaction back.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn vendor(&mut self, vendor_id: VendorId) -> Result<Option<Vendor>, StoreError> {
        let row = sqlx::query("SELECT id, name FROM vendors WHERE id = $1")
            .bind(vendor_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("vendor", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let name: String = row.try_get("name").map_err(|e| map_sqlx_error("vendor", e))?;
        Vendor::new(vendor_id, name)
            .map(Some)
            .map_err(|e| StoreError::corrupt("vendor", e.to_string()))
    }

    async fn rate_agreement(
        &mut self,
        vendor_id: VendorId,
        scrap_type_id: ScrapTypeId,
    ) -> Result<Option<RateAgreement>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT vr.rate, st.material_name
            FROM vendor_rates vr
            JOIN scrap_types st ON st.id = vr.scrap_type_id
            WHERE vr.vendor_id = $1 AND vr.scrap_type_id = $2
            "#,
        )
        .bind(vendor_id.as_uuid())
        .bind(scrap_type_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("rate_agreement", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let rate: Decimal = row.try_get("rate").map_err(|e| map_sqlx_error("rate_agreement", e))?;
        let material: String = row
            .try_get("material_name")
            .map_err(|e| map_sqlx_error("rate_agreement", e))?;
        Ok(Some(RateAgreement::new(
            vendor_id,
            scrap_type_id,
            Rate::new(rate),
            material,
        )))
    }

    #[instrument(skip(self, header), fields(purchase_id = %header.id, kind = header.kind.as_str()), err)]
    async fn insert_purchase_header(&mut self, header: &PurchaseHeader) -> Result<(), StoreError> {
        let query = match header.kind {
            PurchaseKind::Feriwala => sqlx::query(
                r#"
                INSERT INTO feriwala_records
                    (id, company_id, godown_id, vendor_id, date, total_amount, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(header.id.as_uuid())
            .bind(header.scope.company_id.as_uuid())
            .bind(header.scope.godown_id.as_uuid())
            .bind(header.vendor_id.as_uuid())
            .bind(header.date)
            .bind(header.total_amount.value())
            .bind(header.created_at),
            PurchaseKind::Kabadiwala => sqlx::query(
                r#"
                INSERT INTO kabadiwala_records
                    (id, company_id, godown_id, vendor_id, kabadiwala_name, date, total_amount,
                     payment_mode, payment_status, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(header.id.as_uuid())
            .bind(header.scope.company_id.as_uuid())
            .bind(header.scope.godown_id.as_uuid())
            .bind(header.vendor_id.as_uuid())
            .bind(header.vendor_name.as_str())
            .bind(header.date)
            .bind(header.total_amount.value())
            .bind(header.payment_mode.as_ref().map(|m| m.as_str().to_string()))
            .bind(header.payment_status.map(|s| s.as_str()))
            .bind(header.created_at),
        };

        query
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_purchase_header", e))?;
        Ok(())
    }

    async fn insert_purchase_line(
        &mut self,
        kind: PurchaseKind,
        line: &PurchaseLine,
    ) -> Result<(), StoreError> {
        let sql = match kind {
            PurchaseKind::Feriwala => {
                r#"
                INSERT INTO feriwala_scraps
                    (id, feriwala_id, scrap_type_id, material, weight, rate, amount)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#
            }
            PurchaseKind::Kabadiwala => {
                r#"
                INSERT INTO kabadiwala_scraps
                    (id, kabadiwala_id, scrap_type_id, material, weight, rate, amount)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#
            }
        };

        sqlx::query(sql)
            .bind(line.id.as_uuid())
            .bind(line.purchase_id.as_uuid())
            .bind(line.scrap_type_id.as_uuid())
            .bind(line.material.as_str())
            .bind(line.weight.value())
            .bind(line.rate.value())
            .bind(line.amount.value())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_purchase_line", e))?;
        Ok(())
    }

    async fn update_purchase_total(
        &mut self,
        kind: PurchaseKind,
        purchase_id: PurchaseId,
        total: Money,
    ) -> Result<(), StoreError> {
        let sql = match kind {
            PurchaseKind::Feriwala => "UPDATE feriwala_records SET total_amount = $1 WHERE id = $2",
            PurchaseKind::Kabadiwala => {
                "UPDATE kabadiwala_records SET total_amount = $1 WHERE id = $2"
            }
        };

        let result = sqlx::query(sql)
            .bind(total.value())
            .bind(purchase_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_purchase_total", e))?;

        if result.rows_affected() != 1 {
            return Err(StoreError::corrupt(
                "update_purchase_total",
                format!("no {} purchase {purchase_id}", kind.as_str()),
            ));
        }
        Ok(())
    }

    async fn update_payment_status(
        &mut self,
        purchase_id: PurchaseId,
        status: PaymentStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE kabadiwala_records SET payment_status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(purchase_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_payment_status", e))?;

        if result.rows_affected() != 1 {
            return Err(StoreError::corrupt(
                "update_payment_status",
                format!("no kabadiwala purchase {purchase_id}"),
            ));
        }
        Ok(())
    }

    async fn insert_payment(&mut self, payment: &PaymentRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kabadiwala_payments
                (id, kabadiwala_id, amount, mode, note, date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.purchase_id.as_uuid())
        .bind(payment.amount.value())
        .bind(payment.mode.as_str())
        .bind(payment.note.as_str())
        .bind(payment.date)
        .bind(payment.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_payment", e))?;
        Ok(())
    }

    #[instrument(skip(self, entry), fields(account_id = %entry.account_id, category = %entry.category), err)]
    async fn insert_ledger_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO account_transactions
                (id, company_id, godown_id, account_id, type, amount, category, reference,
                 metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.scope.company_id.as_uuid())
        .bind(entry.scope.godown_id.as_uuid())
        .bind(entry.account_id.as_uuid())
        .bind(entry.direction.as_str())
        .bind(entry.amount.value())
        .bind(entry.category.as_str())
        .bind(entry.reference.as_str())
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_ledger_entry", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn adjust_account_balance(
        &mut self,
        account_id: AccountId,
        delta: Money,
    ) -> Result<bool, StoreError> {
        // Single statement so concurrent scopes cannot lose an update.
        let result = sqlx::query("UPDATE accounts SET balance = balance + $1 WHERE id = $2")
            .bind(delta.value())
            .bind(account_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("adjust_account_balance", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_sale(&mut self, sale: &Sale) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO maal_out
                (id, company_id, godown_id, firm_name, bill_to, date, weight, rate, amount,
                 gst, freight, vehicle_no, payment_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(sale.id.as_uuid())
        .bind(sale.scope.company_id.as_uuid())
        .bind(sale.scope.godown_id.as_uuid())
        .bind(sale.firm_name.as_str())
        .bind(sale.bill_to.as_deref())
        .bind(sale.date)
        .bind(sale.weight.value())
        .bind(sale.rate.value())
        .bind(sale.amount.value())
        .bind(sale.gst)
        .bind(sale.freight.map(|f| f.value()))
        .bind(sale.vehicle_no.as_deref())
        .bind(sale.payment_type.as_deref())
        .bind(sale.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_sale", e))?;
        Ok(())
    }

    async fn insert_sale_payment(&mut self, payment: &SalePayment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO maal_out_payments
                (id, company_id, godown_id, firm_name, amount, date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.scope.company_id.as_uuid())
        .bind(payment.scope.godown_id.as_uuid())
        .bind(payment.firm_name.as_str())
        .bind(payment.amount.value())
        .bind(payment.date)
        .bind(payment.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_sale_payment", e))?;
        Ok(())
    }

    async fn labourer(&mut self, labour_id: LabourId) -> Result<Option<Labourer>, StoreError> {
        let row = sqlx::query(
            "SELECT id, company_id, godown_id, name, daily_wage FROM labour WHERE id = $1",
        )
        .bind(labour_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("labourer", e))?;

        row.as_ref()
            .map(|row| labourer_from_row(row, "labourer"))
            .transpose()
    }

    async fn upsert_attendance(&mut self, record: &AttendanceRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO labour_attendance
                (labour_id, company_id, godown_id, date, status, marked_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (labour_id, date)
            DO UPDATE SET status = EXCLUDED.status, marked_at = EXCLUDED.marked_at
            "#,
        )
        .bind(record.labour_id.as_uuid())
        .bind(record.scope.company_id.as_uuid())
        .bind(record.scope.godown_id.as_uuid())
        .bind(record.date)
        .bind(record.status.as_str())
        .bind(record.marked_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_attendance", e))?;
        Ok(())
    }

    #[instrument(skip(self, expense), fields(expense_id = %expense.id, category = %expense.category), err)]
    async fn insert_expense(&mut self, expense: &Expense) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO expenses
                (id, company_id, godown_id, date, category, description, paid_to,
                 payment_mode, amount, account_id, created_by_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(expense.id.as_uuid())
        .bind(expense.scope.company_id.as_uuid())
        .bind(expense.scope.godown_id.as_uuid())
        .bind(expense.date)
        .bind(expense.category.as_str())
        .bind(expense.description.as_deref())
        .bind(expense.paid_to.as_deref())
        .bind(expense.payment_mode.as_str())
        .bind(expense.amount.value())
        .bind(expense.account_id.map(Uuid::from))
        .bind(expense.created_by_name.as_deref())
        .bind(expense.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_expense", e))?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn map_sqlx_error(op: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_string();
            match db_err.code().as_deref() {
                Some("23505") | Some("40001") | Some("40P01") => {
                    StoreError::Conflict { op, message }
                }
                _ => StoreError::Query { op, message },
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => StoreError::Unavailable {
            op,
            message: "connection pool exhausted or closed".to_string(),
        },
        sqlx::Error::Io(e) => StoreError::Unavailable {
            op,
            message: e.to_string(),
        },
        sqlx::Error::Tls(e) => StoreError::Unavailable {
            op,
            message: e.to_string(),
        },
        e @ (sqlx::Error::RowNotFound
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)) => StoreError::corrupt(op, e.to_string()),
        other => StoreError::query(op, other.to_string()),
    }
}

fn scope_from_row(row: &PgRow) -> Result<Scope, sqlx::Error> {
    let company_id: Uuid = row.try_get("company_id")?;
    let godown_id: Uuid = row.try_get("godown_id")?;
    Ok(Scope::new(company_id.into(), godown_id.into()))
}

fn line_view_from_row(row: &PgRow, material_column: &str) -> Result<PurchaseLineView, sqlx::Error> {
    Ok(PurchaseLineView {
        material_name: row.try_get(material_column)?,
        weight: Weight::new(row.try_get("weight")?),
        rate: Rate::new(row.try_get("rate")?),
        amount: Money::new(row.try_get("amount")?),
    })
}

fn feriwala_from_row(
    row: &PgRow,
    scraps: Vec<PurchaseLineView>,
) -> Result<FeriwalaRecordView, sqlx::Error> {
    let scope = scope_from_row(row)?;
    Ok(FeriwalaRecordView {
        id: row.try_get::<Uuid, _>("id")?.into(),
        date: row.try_get("date")?,
        company_id: scope.company_id,
        godown_id: scope.godown_id,
        vendor_id: row.try_get::<Uuid, _>("vendor_id")?.into(),
        total_amount: Money::new(row.try_get("total_amount")?),
        vendor_name: row.try_get("vendor_name")?,
        scraps,
    })
}

fn kabadiwala_summary_from_row(row: &PgRow) -> Result<KabadiwalaSummaryView, sqlx::Error> {
    let scope = scope_from_row(row)?;
    let payment_mode: Option<String> = row.try_get("payment_mode")?;
    let payment_status: Option<String> = row.try_get("payment_status")?;
    Ok(KabadiwalaSummaryView {
        id: row.try_get::<Uuid, _>("id")?.into(),
        company_id: scope.company_id,
        godown_id: scope.godown_id,
        vendor_id: row.try_get::<Uuid, _>("vendor_id")?.into(),
        kabadiwala_name: row.try_get("kabadiwala_name")?,
        date: row.try_get("date")?,
        total_amount: Money::new(row.try_get("total_amount")?),
        payment_mode: payment_mode.map(PaymentMode::new),
        payment_status: payment_status.as_deref().and_then(PaymentStatus::parse),
        created_at: row.try_get("created_at")?,
        items_count: row.try_get("items_count")?,
        total_weight: Weight::new(row.try_get("total_weight")?),
        scrap_total: Money::new(row.try_get("scrap_total")?),
        total_paid: Money::new(row.try_get("total_paid")?),
    })
}

fn owner_entry_from_row(row: &PgRow) -> Result<KabadiwalaOwnerEntry, sqlx::Error> {
    let payment_status: Option<String> = row.try_get("payment_status")?;
    Ok(KabadiwalaOwnerEntry {
        date: row.try_get("date")?,
        kabadi_name: row.try_get("kabadiwala_name")?,
        material: row.try_get("material")?,
        weight: Weight::new(row.try_get("weight")?),
        rate: Rate::new(row.try_get("rate")?),
        amount: Money::new(row.try_get("amount")?),
        payment_status: payment_status.as_deref().and_then(PaymentStatus::parse),
    })
}

fn sale_from_row(row: &PgRow) -> Result<Sale, sqlx::Error> {
    let freight: Option<Decimal> = row.try_get("freight")?;
    Ok(Sale {
        id: row.try_get::<Uuid, _>("id")?.into(),
        scope: scope_from_row(row)?,
        firm_name: row.try_get("firm_name")?,
        bill_to: row.try_get("bill_to")?,
        date: row.try_get("date")?,
        weight: Weight::new(row.try_get("weight")?),
        rate: Rate::new(row.try_get("rate")?),
        amount: Money::new(row.try_get("amount")?),
        gst: row.try_get("gst")?,
        freight: freight.map(Money::new),
        vehicle_no: row.try_get("vehicle_no")?,
        payment_type: row.try_get("payment_type")?,
        created_at: row.try_get("created_at")?,
    })
}

fn sale_payment_from_row(row: &PgRow) -> Result<SalePayment, sqlx::Error> {
    Ok(SalePayment {
        id: row.try_get::<Uuid, _>("id")?.into(),
        scope: scope_from_row(row)?,
        firm_name: row.try_get("firm_name")?,
        amount: Money::new(row.try_get("amount")?),
        date: row.try_get("date")?,
        created_at: row.try_get("created_at")?,
    })
}

fn expense_from_row(row: &PgRow) -> Result<ExpenseView, sqlx::Error> {
    Ok(ExpenseView {
        id: row.try_get::<Uuid, _>("id")?.into(),
        date: row.try_get("date")?,
        category: row.try_get("category")?,
        description: row.try_get("description")?,
        paid_to: row.try_get("paid_to")?,
        payment_mode: row.try_get("payment_mode")?,
        amount: Money::new(row.try_get("amount")?),
        account_id: row.try_get::<Option<Uuid>, _>("account_id")?.map(AccountId::from),
        account_name: row.try_get("account_name")?,
        created_by_name: row.try_get("created_by_name")?,
        created_at: row.try_get("created_at")?,
    })
}

fn labourer_from_row(row: &PgRow, op: &'static str) -> Result<Labourer, StoreError> {
    let id: Uuid = row.try_get("id").map_err(|e| map_sqlx_error(op, e))?;
    let scope = scope_from_row(row).map_err(|e| map_sqlx_error(op, e))?;
    let name: String = row.try_get("name").map_err(|e| map_sqlx_error(op, e))?;
    let daily_wage: Decimal = row.try_get("daily_wage").map_err(|e| map_sqlx_error(op, e))?;
    Labourer::new(id.into(), scope, name, Money::new(daily_wage))
        .map_err(|e| StoreError::corrupt(op, e.to_string()))
}

fn attendance_from_row(row: &PgRow) -> Result<AttendanceRecord, StoreError> {
    let op = "attendance_on";
    let labour_id: Uuid = row.try_get("labour_id").map_err(|e| map_sqlx_error(op, e))?;
    let status: String = row.try_get("status").map_err(|e| map_sqlx_error(op, e))?;
    let status = AttendanceStatus::parse(&status)
        .ok_or_else(|| StoreError::corrupt(op, format!("unknown attendance status {status:?}")))?;
    let date: NaiveDate = row.try_get("date").map_err(|e| map_sqlx_error(op, e))?;
    let marked_at: DateTime<Utc> = row.try_get("marked_at").map_err(|e| map_sqlx_error(op, e))?;
    Ok(AttendanceRecord {
        scope: scope_from_row(row).map_err(|e| map_sqlx_error(op, e))?,
        labour_id: LabourId::from(labour_id),
        date,
        status,
        marked_at,
    })
}
