use serde::{Deserialize, Serialize};

use scrapyard_core::{DomainResult, Entity, LabourId, Money, Scope};

use crate::vendor::normalize_name;

/// Daily-wage worker attached to one godown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labourer {
    id: LabourId,
    scope: Scope,
    name: String,
    daily_wage: Money,
}

impl Labourer {
    pub fn new(
        id: LabourId,
        scope: Scope,
        name: impl Into<String>,
        daily_wage: Money,
    ) -> DomainResult<Self> {
        let name = normalize_name(name.into())?;
        let daily_wage = daily_wage.ensure_positive("daily_wage")?;
        Ok(Self {
            id,
            scope,
            name,
            daily_wage,
        })
    }

    pub fn id_typed(&self) -> LabourId {
        self.id
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn daily_wage(&self) -> Money {
        self.daily_wage
    }
}

impl Entity for Labourer {
    type Id = LabourId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
