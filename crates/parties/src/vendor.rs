use serde::{Deserialize, Serialize};

use scrapyard_core::{DomainError, DomainResult, Entity, VendorId};

/// External supplier of scrap (a feriwala or kabadiwala).
///
/// Vendors are master data: purchase workflows only look them up by id and
/// copy the display name into their records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    id: VendorId,
    name: String,
}

impl Vendor {
    pub fn new(id: VendorId, name: impl Into<String>) -> DomainResult<Self> {
        let name = normalize_name(name.into())?;
        Ok(Self { id, name })
    }

    pub fn id_typed(&self) -> VendorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Vendor {
    type Id = VendorId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

pub(crate) fn normalize_name(name: String) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}
