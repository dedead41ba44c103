use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use petclinic_core::validation::{validate_field, Errors, Rule, Validate};
use petclinic_core::{Entity, PetId, VisitId};

/// A single visit of a pet to the clinic.
///
/// The pet is referenced by a copied id value, not by an object reference;
/// `Pet::add_visit` stamps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: Option<VisitId>,
    pub date: NaiveDate,
    pub description: String,
    pub pet_id: Option<PetId>,
}

impl Visit {
    /// A new visit dated today.
    pub fn new() -> Self {
        Self::on(Local::now().date_naive(), "")
    }

    pub fn on(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            id: None,
            date,
            description: description.into(),
            pet_id: None,
        }
    }
}

impl Default for Visit {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Visit {
    type Id = VisitId;

    fn id(&self) -> Option<VisitId> {
        self.id
    }
}

impl Validate for Visit {
    fn validate(&self, errors: &mut Errors) {
        validate_field(
            errors,
            "description",
            &self.description,
            &[Rule::NotEmpty, Rule::MaxLength(255)],
        );
    }
}
