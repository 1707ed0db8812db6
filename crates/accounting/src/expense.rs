use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use scrapyard_core::{AccountId, DomainError, DomainResult, Entity, ExpenseId, Money, Scope};

use crate::ledger::LedgerPosting;

/// Ledger category used when an expense is paid out of a funding account.
pub const EXPENSE_CATEGORY: &str = "expense";

/// Running cost of a godown, entered by the manager for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub scope: Scope,
    pub date: NaiveDate,
    pub category: String,
    pub description: Option<String>,
    pub paid_to: Option<String>,
    /// Lowercased; `cash` when none was given.
    pub payment_mode: String,
    pub amount: Money,
    pub account_id: Option<AccountId>,
    pub created_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Expense {
    type Id = ExpenseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Expense {
    /// Debit for the funding account, when the expense names one.
    pub fn ledger_posting(&self) -> DomainResult<Option<LedgerPosting>> {
        self.account_id
            .map(|account_id| {
                LedgerPosting::debit(
                    self.scope,
                    account_id,
                    self.amount,
                    EXPENSE_CATEGORY,
                    format!("Expense: {}", self.category),
                )
            })
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    pub scope: Scope,
    pub date: NaiveDate,
    pub category: String,
    pub description: Option<String>,
    pub paid_to: Option<String>,
    pub payment_mode: Option<String>,
    pub amount: Money,
    pub account_id: Option<AccountId>,
    pub created_by_name: Option<String>,
}

impl NewExpense {
    pub fn into_expense(self, id: ExpenseId, created_at: DateTime<Utc>) -> DomainResult<Expense> {
        let category = self.category.trim();
        if category.is_empty() {
            return Err(DomainError::validation("category is required"));
        }

        Ok(Expense {
            id,
            scope: self.scope,
            date: self.date,
            category: category.to_string(),
            description: optional_text(self.description),
            paid_to: optional_text(self.paid_to),
            payment_mode: optional_text(self.payment_mode)
                .map(|m| m.to_lowercase())
                .unwrap_or_else(|| "cash".to_string()),
            amount: self.amount.ensure_positive("amount")?,
            account_id: self.account_id,
            created_by_name: optional_text(self.created_by_name),
            created_at,
        })
    }
}

/// Totals over a set of expenses, split by how they were paid.
///
/// Modes other than cash, UPI and bank count towards `total_amount` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub total_amount: Money,
    pub total_cash: Money,
    pub total_upi: Money,
    pub total_bank: Money,
}

impl ExpenseSummary {
    pub fn add(&mut self, payment_mode: &str, amount: Money) -> DomainResult<()> {
        self.total_amount = self.total_amount.checked_add(amount)?;
        let bucket = match payment_mode {
            "cash" => &mut self.total_cash,
            "upi" => &mut self.total_upi,
            mode if mode.starts_with("bank") => &mut self.total_bank,
            _ => return Ok(()),
        };
        *bucket = bucket.checked_add(amount)?;
        Ok(())
    }

    pub fn tally<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> DomainResult<Self> {
        let mut summary = Self::default();
        for expense in expenses {
            summary.add(&expense.payment_mode, expense.amount)?;
        }
        Ok(summary)
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
