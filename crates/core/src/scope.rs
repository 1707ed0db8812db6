//! Company/godown scope every business record belongs to.

use serde::{Deserialize, Serialize};

use crate::id::{CompanyId, GodownId};
use crate::value_object::ValueObject;

/// Ownership boundary of a record: which company, and which of its godowns.
///
/// Every read and write is filtered by the full scope; records of one godown
/// are never visible through another.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub company_id: CompanyId,
    pub godown_id: GodownId,
}

impl Scope {
    pub fn new(company_id: CompanyId, godown_id: GodownId) -> Self {
        Self {
            company_id,
            godown_id,
        }
    }
}

impl ValueObject for Scope {}
