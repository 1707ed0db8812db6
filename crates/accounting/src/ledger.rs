use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use scrapyard_core::{AccountId, DomainError, DomainResult, Entity, LedgerEntryId, Money, Scope};

/// Direction money moves relative to the funding account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    /// Money leaves the account.
    Debit,
    /// Money enters the account.
    Credit,
}

impl EntryDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryDirection::Debit => "debit",
            EntryDirection::Credit => "credit",
        }
    }
}

/// Funding account (cash box, bank) with a running balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub balance: Money,
}

impl Account {
    pub fn new(id: AccountId, name: impl Into<String>, opening_balance: Money) -> Self {
        Self {
            id,
            name: name.into(),
            balance: opening_balance,
        }
    }

    /// Apply the balance effect of a posted entry.
    pub fn apply(&mut self, entry: &LedgerEntry) -> DomainResult<()> {
        if entry.account_id != self.id {
            return Err(DomainError::invariant("ledger entry posted against another account"));
        }
        self.balance = self.balance.checked_add(entry.signed_amount())?;
        Ok(())
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Immutable record of money moving through a funding account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub scope: Scope,
    pub account_id: AccountId,
    pub direction: EntryDirection,
    /// Always positive; `direction` carries the sign.
    pub amount: Money,
    pub category: String,
    pub reference: String,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Amount with the sign of its effect on the account balance.
    pub fn signed_amount(&self) -> Money {
        match self.direction {
            EntryDirection::Debit => Money::ZERO - self.amount,
            EntryDirection::Credit => self.amount,
        }
    }
}

impl Entity for LedgerEntry {
    type Id = LedgerEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A validated request to post one ledger entry.
///
/// The entry and the matching balance adjustment must be applied in the same
/// transactional scope; this type only guarantees the entry itself is sound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPosting {
    scope: Scope,
    account_id: AccountId,
    direction: EntryDirection,
    amount: Money,
    category: String,
    reference: String,
    metadata: JsonValue,
}

impl LedgerPosting {
    /// Money paid out of `account_id`.
    pub fn debit(
        scope: Scope,
        account_id: AccountId,
        amount: Money,
        category: impl Into<String>,
        reference: impl Into<String>,
    ) -> DomainResult<Self> {
        let amount = amount.ensure_positive("ledger amount")?;
        let category = category.into();
        if category.trim().is_empty() {
            return Err(DomainError::validation("ledger category cannot be empty"));
        }

        Ok(Self {
            scope,
            account_id,
            direction: EntryDirection::Debit,
            amount,
            category,
            reference: reference.into(),
            metadata: JsonValue::Object(Default::default()),
        })
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Signed change this posting makes to the account balance.
    pub fn balance_delta(&self) -> Money {
        match self.direction {
            EntryDirection::Debit => Money::ZERO - self.amount,
            EntryDirection::Credit => self.amount,
        }
    }

    pub fn into_entry(self, id: LedgerEntryId, created_at: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id,
            scope: self.scope,
            account_id: self.account_id,
            direction: self.direction,
            amount: self.amount,
            category: self.category,
            reference: self.reference,
            metadata: self.metadata,
            created_at,
        }
    }
}
