use serde::{Deserialize, Serialize};

use petclinic_core::{Entity, Named, SpecialtyId};

/// Lookup entity: a medical specialty ("radiology", "surgery", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Specialty {
    pub id: Option<SpecialtyId>,
    pub name: String,
}

impl Specialty {
    pub fn new(id: SpecialtyId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }
}

impl Entity for Specialty {
    type Id = SpecialtyId;

    fn id(&self) -> Option<SpecialtyId> {
        self.id
    }
}

impl Named for Specialty {
    fn name(&self) -> &str {
        &self.name
    }
}

impl core::fmt::Display for Specialty {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}
