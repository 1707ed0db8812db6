use chrono::Utc;
use serde::Serialize;
use tracing::{Span, debug, error, info, instrument, warn};

use scrapyard_accounting::LedgerPosting;
use scrapyard_core::{LedgerEntryId, Money, PaymentId, PurchaseId, PurchaseLineId};
use scrapyard_purchasing::{
    NewPurchase, PaymentStatus, PurchaseDraft, PurchaseKind, Settlement,
};

use crate::store::{Store, StoreTx};

use super::ledger_poster::post_ledger_entry;
use super::rate_resolver::resolve_rate;
use super::{PurchaseAborted, WorkflowError, WorkflowStage};

/// What the caller gets back from a committed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseReceipt {
    pub purchase_id: PurchaseId,
    pub kind: PurchaseKind,
    pub total_amount: Money,
    pub vendor_name: String,
    pub payment_status: Option<PaymentStatus>,
    pub line_count: usize,
    pub ledger_entry_id: Option<LedgerEntryId>,
}

/// Purchase Transaction Orchestrator.
///
/// Records one feriwala or kabadiwala purchase inside a single transactional
/// scope: header, priced lines, total, optional payment, optional ledger entry
/// and balance debit. Either all of it commits or none of it does.
///
/// Concurrent purchases are serialized by the store; the orchestrator takes no
/// locks of its own.
#[derive(Debug, Clone)]
pub struct PurchaseWorkflow<S> {
    store: S,
}

impl<S: Store> PurchaseWorkflow<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(
        skip(self, request),
        fields(
            kind = request.kind().as_str(),
            company_id = %request.scope.company_id,
            godown_id = %request.scope.godown_id,
            vendor_id = %request.vendor_id,
            purchase_id = tracing::field::Empty,
        )
    )]
    pub async fn record(&self, request: NewPurchase) -> Result<PurchaseReceipt, PurchaseAborted> {
        let stage = WorkflowStage::Started;

        // Input errors are caught before a scope exists.
        if request.lines.is_empty() {
            return Err(PurchaseAborted::at(stage, WorkflowError::EmptyLineSet));
        }
        request
            .validate()
            .map_err(|e| PurchaseAborted::at(stage, e))?;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| PurchaseAborted::at(stage, e))?;

        let mut progress = Progress { stage };
        match apply(&mut tx, &request, &mut progress).await {
            Ok(receipt) => {
                if let Err(e) = tx.commit().await {
                    warn!(stage = progress.stage.as_str(), error = %e, "purchase commit failed");
                    return Err(PurchaseAborted::at(progress.stage, e));
                }
                progress.advance(WorkflowStage::Committed);
                info!(
                    purchase_id = %receipt.purchase_id,
                    total_amount = %receipt.total_amount,
                    line_count = receipt.line_count,
                    "purchase committed"
                );
                Ok(receipt)
            }
            Err(cause) => {
                warn!(stage = progress.stage.as_str(), error = %cause, "purchase aborted, rolling back");
                if let Err(e) = tx.rollback().await {
                    error!(error = %e, "rollback failed; scope is discarded on drop");
                }
                Err(PurchaseAborted::at(progress.stage, cause))
            }
        }
    }
}

struct Progress {
    stage: WorkflowStage,
}

impl Progress {
    fn advance(&mut self, next: WorkflowStage) {
        debug!(from = self.stage.as_str(), to = next.as_str(), "purchase stage");
        self.stage = next;
    }
}

async fn apply<T: StoreTx>(
    tx: &mut T,
    request: &NewPurchase,
    progress: &mut Progress,
) -> Result<PurchaseReceipt, WorkflowError> {
    let now = Utc::now();
    let kind = request.kind();

    let vendor = tx
        .vendor(request.vendor_id)
        .await?
        .ok_or(WorkflowError::VendorNotFound(request.vendor_id))?;
    progress.advance(WorkflowStage::VendorResolved);

    let mut draft = PurchaseDraft::open(PurchaseId::new(), request, &vendor, now);
    let purchase_id = draft.header().id;
    Span::current().record("purchase_id", tracing::field::display(purchase_id));
    tx.insert_purchase_header(draft.header()).await?;

    for line in &request.lines {
        let agreement = resolve_rate(tx, vendor.id_typed(), line.scrap_type_id).await?;
        let priced = draft.add_line(PurchaseLineId::new(), &agreement, line.weight)?;
        tx.insert_purchase_line(kind, priced).await?;
    }
    progress.advance(WorkflowStage::LinesPriced);

    let total = draft.finalize_total()?;
    tx.update_purchase_total(kind, purchase_id, total).await?;
    progress.advance(WorkflowStage::TotalFinalized);

    let mut payment_status = None;
    if let Settlement::Deferred(terms) = &request.settlement {
        let outcome = draft.settle(PaymentId::new(), terms, now)?;
        tx.update_payment_status(purchase_id, outcome.status).await?;
        if let Some(payment) = &outcome.payment {
            tx.insert_payment(payment).await?;
        }
        payment_status = Some(outcome.status);
        progress.advance(WorkflowStage::PaymentClassified);
    }

    let paid_now = draft.amount_paid_now(&request.settlement);
    let mut ledger_entry_id = None;
    match request.funding_account {
        Some(account_id) if paid_now.is_positive() => {
            let posting = LedgerPosting::debit(
                request.scope,
                account_id,
                paid_now,
                kind.ledger_category(),
                kind.ledger_reference(vendor.name()),
            )?;
            let entry = post_ledger_entry(tx, posting, now).await?;
            ledger_entry_id = Some(entry.id);
            progress.advance(WorkflowStage::Ledgered);
        }
        None if paid_now.is_positive() => {
            warn!(
                amount = %paid_now,
                "payment recorded without a funding account; no ledger entry posted"
            );
        }
        _ => {}
    }

    let (header, lines) = draft.into_parts();
    Ok(PurchaseReceipt {
        purchase_id,
        kind,
        total_amount: header.total_amount,
        vendor_name: header.vendor_name,
        payment_status,
        line_count: lines.len(),
        ledger_entry_id,
    })
}
