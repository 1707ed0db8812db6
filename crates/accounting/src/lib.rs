//! Accounting module: funding accounts, their append-only ledger and the
//! godown expense book.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod expense;
pub mod ledger;

pub use expense::{EXPENSE_CATEGORY, Expense, ExpenseSummary, NewExpense};
pub use ledger::{Account, EntryDirection, LedgerEntry, LedgerPosting};
