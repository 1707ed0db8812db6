use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use scrapyard_core::{
    AccountId, DomainError, DomainResult, Entity, Money, PaymentId, PurchaseId, PurchaseLineId,
    Rate, Scope, ScrapTypeId, VendorId, Weight,
};
use scrapyard_parties::Vendor;

use crate::payment::{PaymentMode, PaymentRecord, PaymentStatus, PaymentTerms};
use crate::pricing::price_line;
use crate::rate::RateAgreement;

/// Which book a purchase belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseKind {
    /// Street hawker purchase, paid in full from a funding account on the spot.
    Feriwala,
    /// Kabadiwala purchase, paid now, partly, or later.
    Kabadiwala,
}

impl PurchaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseKind::Feriwala => "feriwala",
            PurchaseKind::Kabadiwala => "kabadiwala",
        }
    }

    /// Ledger category used when this kind of purchase moves money.
    pub fn ledger_category(&self) -> &'static str {
        match self {
            PurchaseKind::Feriwala => "feriwala purchase",
            PurchaseKind::Kabadiwala => "kabadiwala payment",
        }
    }

    /// Human-readable ledger reference for a payment to `vendor_name`.
    pub fn ledger_reference(&self, vendor_name: &str) -> String {
        match self {
            PurchaseKind::Feriwala => format!("Purchase from {vendor_name}"),
            PurchaseKind::Kabadiwala => format!("Payment to {vendor_name}"),
        }
    }
}

/// How a purchase gets paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    /// The whole total is paid from the funding account immediately.
    FullPayment,
    /// Whatever is handed over now is recorded; the rest stays outstanding.
    Deferred(PaymentTerms),
}

/// One requested line: which scrap type, and how much of it was weighed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub scrap_type_id: ScrapTypeId,
    pub weight: Weight,
}

/// Request to record a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub scope: Scope,
    pub vendor_id: VendorId,
    pub lines: Vec<LineRequest>,
    pub funding_account: Option<AccountId>,
    pub settlement: Settlement,
}

impl NewPurchase {
    pub fn kind(&self) -> PurchaseKind {
        match self.settlement {
            Settlement::FullPayment => PurchaseKind::Feriwala,
            Settlement::Deferred(_) => PurchaseKind::Kabadiwala,
        }
    }

    /// Field-level validation that needs no lookups.
    ///
    /// An empty line set is not checked here; callers report it separately.
    pub fn validate(&self) -> DomainResult<()> {
        for (idx, line) in self.lines.iter().enumerate() {
            line.weight.ensure_positive(&format!("scraps[{idx}].weight"))?;
        }

        match &self.settlement {
            Settlement::FullPayment => {
                if self.funding_account.is_none() {
                    return Err(DomainError::validation("Account ID is required"));
                }
            }
            Settlement::Deferred(terms) => terms.validate()?,
        }

        Ok(())
    }
}

/// Persisted purchase header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseHeader {
    pub id: PurchaseId,
    pub kind: PurchaseKind,
    pub scope: Scope,
    pub vendor_id: VendorId,
    /// Vendor display name at the time of purchase.
    pub vendor_name: String,
    pub date: NaiveDate,
    pub total_amount: Money,
    pub payment_status: Option<PaymentStatus>,
    pub payment_mode: Option<PaymentMode>,
    pub created_at: DateTime<Utc>,
}

impl Entity for PurchaseHeader {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Persisted purchase line: `amount == weight * rate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub id: PurchaseLineId,
    pub purchase_id: PurchaseId,
    pub scrap_type_id: ScrapTypeId,
    pub material: String,
    pub weight: Weight,
    pub rate: Rate,
    pub amount: Money,
}

impl Entity for PurchaseLine {
    type Id = PurchaseLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Result of settling a deferred purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementOutcome {
    pub status: PaymentStatus,
    pub payment: Option<PaymentRecord>,
}

/// In-progress purchase: the pure half of recording a purchase.
///
/// The header starts with a zero total. Lines are priced one by one into a
/// running total, which is only written onto the header by `finalize_total`.
/// Storage mirrors each step inside the same transactional scope.
#[derive(Debug, Clone)]
pub struct PurchaseDraft {
    header: PurchaseHeader,
    lines: Vec<PurchaseLine>,
    running_total: Money,
    finalized: bool,
}

impl PurchaseDraft {
    pub fn open(id: PurchaseId, request: &NewPurchase, vendor: &Vendor, now: DateTime<Utc>) -> Self {
        let kind = request.kind();
        let (date, payment_mode, payment_status) = match &request.settlement {
            Settlement::FullPayment => (now.date_naive(), None, None),
            Settlement::Deferred(terms) => (
                terms.date,
                Some(terms.mode.clone()),
                Some(PaymentStatus::Pending),
            ),
        };

        Self {
            header: PurchaseHeader {
                id,
                kind,
                scope: request.scope,
                vendor_id: vendor.id_typed(),
                vendor_name: vendor.name().to_string(),
                date,
                total_amount: Money::ZERO,
                payment_status,
                payment_mode,
                created_at: now,
            },
            lines: Vec::new(),
            running_total: Money::ZERO,
            finalized: false,
        }
    }

    pub fn header(&self) -> &PurchaseHeader {
        &self.header
    }

    pub fn lines(&self) -> &[PurchaseLine] {
        &self.lines
    }

    pub fn running_total(&self) -> Money {
        self.running_total
    }

    /// Price one line against its rate agreement and append it.
    pub fn add_line(
        &mut self,
        line_id: PurchaseLineId,
        agreement: &RateAgreement,
        weight: Weight,
    ) -> DomainResult<&PurchaseLine> {
        if self.finalized {
            return Err(DomainError::invariant("cannot add lines after the total is finalized"));
        }
        if agreement.vendor_id != self.header.vendor_id {
            return Err(DomainError::invariant("rate agreement belongs to another vendor"));
        }

        let priced = price_line(agreement, weight, &mut self.running_total)?;
        self.lines.push(PurchaseLine {
            id: line_id,
            purchase_id: self.header.id,
            scrap_type_id: agreement.scrap_type_id,
            material: priced.material,
            weight: priced.weight,
            rate: priced.rate,
            amount: priced.amount,
        });

        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Write the accumulated total onto the header.
    pub fn finalize_total(&mut self) -> DomainResult<Money> {
        if self.lines.is_empty() {
            return Err(DomainError::invariant("purchase must contain at least one line"));
        }
        self.header.total_amount = self.running_total;
        self.finalized = true;
        Ok(self.header.total_amount)
    }

    /// Classify the payment handed over with a deferred purchase.
    ///
    /// A payment record is produced only when money actually changed hands.
    pub fn settle(
        &mut self,
        payment_id: PaymentId,
        terms: &PaymentTerms,
        now: DateTime<Utc>,
    ) -> DomainResult<SettlementOutcome> {
        if !self.finalized {
            return Err(DomainError::invariant("cannot settle before the total is finalized"));
        }

        let status = PaymentStatus::classify(terms.amount, self.header.total_amount);
        self.header.payment_status = Some(status);

        let payment = terms.amount.is_positive().then(|| PaymentRecord {
            id: payment_id,
            purchase_id: self.header.id,
            amount: terms.amount,
            mode: terms.mode.clone(),
            note: terms.note.clone(),
            date: terms.date,
            created_at: now,
        });

        Ok(SettlementOutcome { status, payment })
    }

    /// Money leaving the funding account for this purchase right now.
    pub fn amount_paid_now(&self, settlement: &Settlement) -> Money {
        match settlement {
            Settlement::FullPayment => self.header.total_amount,
            Settlement::Deferred(terms) => terms.amount,
        }
    }

    pub fn into_parts(self) -> (PurchaseHeader, Vec<PurchaseLine>) {
        (self.header, self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use scrapyard_core::{CompanyId, GodownId};

    fn money(v: i64) -> Money {
        Money::new(Decimal::from(v))
    }

    fn weight(v: i64) -> Weight {
        Weight::new(Decimal::from(v))
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn vendor() -> Vendor {
        Vendor::new(VendorId::new(), "Kallu Kabadi").unwrap()
    }

    fn agreement(vendor: &Vendor, rate: i64, material: &str) -> RateAgreement {
        RateAgreement::new(
            vendor.id_typed(),
            ScrapTypeId::new(),
            Rate::new(Decimal::from(rate)),
            material,
        )
    }

    fn request(vendor: &Vendor, settlement: Settlement) -> NewPurchase {
        NewPurchase {
            scope: Scope::new(CompanyId::new(), GodownId::new()),
            vendor_id: vendor.id_typed(),
            lines: vec![LineRequest {
                scrap_type_id: ScrapTypeId::new(),
                weight: weight(5),
            }],
            funding_account: Some(AccountId::new()),
            settlement,
        }
    }

    fn terms(amount: i64) -> PaymentTerms {
        PaymentTerms {
            amount: money(amount),
            mode: PaymentMode::default(),
            note: "advance".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        }
    }

    #[test]
    fn header_total_stays_zero_until_finalized() {
        let vendor = vendor();
        let req = request(&vendor, Settlement::FullPayment);
        let mut draft = PurchaseDraft::open(PurchaseId::new(), &req, &vendor, test_time());

        draft
            .add_line(PurchaseLineId::new(), &agreement(&vendor, 10, "Iron"), weight(5))
            .unwrap();
        assert_eq!(draft.header().total_amount, Money::ZERO);
        assert_eq!(draft.running_total(), money(50));

        let total = draft.finalize_total().unwrap();
        assert_eq!(total, money(50));
        assert_eq!(draft.header().total_amount, money(50));
        assert_eq!(draft.lines()[0].amount, money(50));
    }

    #[test]
    fn cannot_finalize_without_lines() {
        let vendor = vendor();
        let req = request(&vendor, Settlement::FullPayment);
        let mut draft = PurchaseDraft::open(PurchaseId::new(), &req, &vendor, test_time());
        assert!(matches!(
            draft.finalize_total(),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn rejects_rate_of_another_vendor() {
        let vendor = vendor();
        let other = Vendor::new(VendorId::new(), "Someone Else").unwrap();
        let req = request(&vendor, Settlement::FullPayment);
        let mut draft = PurchaseDraft::open(PurchaseId::new(), &req, &vendor, test_time());
        let err = draft
            .add_line(PurchaseLineId::new(), &agreement(&other, 10, "Iron"), weight(1))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert!(draft.lines().is_empty());
    }

    #[test]
    fn full_payment_requires_funding_account() {
        let vendor = vendor();
        let mut req = request(&vendor, Settlement::FullPayment);
        req.funding_account = None;
        assert!(matches!(req.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn deferred_without_account_is_valid() {
        let vendor = vendor();
        let mut req = request(&vendor, Settlement::Deferred(terms(10)));
        req.funding_account = None;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn negative_line_weight_is_invalid() {
        let vendor = vendor();
        let mut req = request(&vendor, Settlement::FullPayment);
        req.lines[0].weight = weight(-2);
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("scraps[0].weight"));
    }

    #[test]
    fn settle_full_payment_creates_paid_record() {
        let vendor = vendor();
        let settlement = Settlement::Deferred(terms(200));
        let req = request(&vendor, settlement.clone());
        let mut draft = PurchaseDraft::open(PurchaseId::new(), &req, &vendor, test_time());
        draft
            .add_line(PurchaseLineId::new(), &agreement(&vendor, 40, "Brass"), weight(5))
            .unwrap();
        draft.finalize_total().unwrap();

        let outcome = draft.settle(PaymentId::new(), &terms(200), test_time()).unwrap();
        assert_eq!(outcome.status, PaymentStatus::Paid);
        let payment = outcome.payment.expect("payment record");
        assert_eq!(payment.amount, money(200));
        assert_eq!(payment.purchase_id, draft.header().id);
        assert_eq!(draft.header().payment_status, Some(PaymentStatus::Paid));
        assert_eq!(draft.amount_paid_now(&settlement), money(200));
    }

    #[test]
    fn settle_without_money_is_pending_and_records_nothing() {
        let vendor = vendor();
        let req = request(&vendor, Settlement::Deferred(terms(0)));
        let mut draft = PurchaseDraft::open(PurchaseId::new(), &req, &vendor, test_time());
        draft
            .add_line(PurchaseLineId::new(), &agreement(&vendor, 40, "Brass"), weight(5))
            .unwrap();
        draft.finalize_total().unwrap();

        let outcome = draft.settle(PaymentId::new(), &terms(0), test_time()).unwrap();
        assert_eq!(outcome.status, PaymentStatus::Pending);
        assert!(outcome.payment.is_none());
    }

    #[test]
    fn deferred_header_uses_payment_date_and_mode() {
        let vendor = vendor();
        let req = request(&vendor, Settlement::Deferred(terms(0)));
        let draft = PurchaseDraft::open(PurchaseId::new(), &req, &vendor, test_time());
        assert_eq!(draft.header().kind, PurchaseKind::Kabadiwala);
        assert_eq!(draft.header().date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(draft.header().payment_status, Some(PaymentStatus::Pending));
        assert_eq!(draft.header().vendor_name, "Kallu Kabadi");
    }

    #[test]
    fn ledger_wording_follows_kind() {
        assert_eq!(PurchaseKind::Feriwala.ledger_category(), "feriwala purchase");
        assert_eq!(PurchaseKind::Feriwala.ledger_reference("Ramu"), "Purchase from Ramu");
        assert_eq!(PurchaseKind::Kabadiwala.ledger_reference("Ramu"), "Payment to Ramu");
    }
}
