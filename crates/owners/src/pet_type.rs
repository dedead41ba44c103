use serde::{Deserialize, Serialize};

use petclinic_core::{Entity, Named, PetTypeId};

/// Lookup entity: the kind of animal ("cat", "dog", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetType {
    pub id: Option<PetTypeId>,
    pub name: String,
}

impl PetType {
    pub fn new(id: PetTypeId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }
}

impl Entity for PetType {
    type Id = PetTypeId;

    fn id(&self) -> Option<PetTypeId> {
        self.id
    }
}

impl Named for PetType {
    fn name(&self) -> &str {
        &self.name
    }
}

impl core::fmt::Display for PetType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}
