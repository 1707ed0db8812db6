use chrono::{DateTime, Utc};
use tracing::debug;

use scrapyard_accounting::{LedgerEntry, LedgerPosting};
use scrapyard_core::LedgerEntryId;

use crate::store::StoreTx;

use super::WorkflowError;

/// Apply the balance delta and append the entry inside the caller's scope.
///
/// The balance goes first: a missing account is `AccountNotFound` before any
/// entry row references it, on every store. The caller still rolls the scope
/// back on error.
pub async fn post_ledger_entry<T: StoreTx>(
    tx: &mut T,
    posting: LedgerPosting,
    now: DateTime<Utc>,
) -> Result<LedgerEntry, WorkflowError> {
    let account_id = posting.account_id();
    let delta = posting.balance_delta();
    let entry = posting.into_entry(LedgerEntryId::new(), now);

    if !tx.adjust_account_balance(account_id, delta).await? {
        return Err(WorkflowError::AccountNotFound(account_id));
    }
    tx.insert_ledger_entry(&entry).await?;

    debug!(
        account_id = %account_id,
        amount = %entry.amount,
        category = %entry.category,
        "ledger entry posted"
    );
    Ok(entry)
}
