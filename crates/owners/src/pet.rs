use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use petclinic_core::validation::{codes, validate_field, Errors, Rule, Validate};
use petclinic_core::{Entity, Named, OwnerId, PetId};
use petclinic_visits::Visit;

use crate::pet_type::PetType;

/// A pet belonging to one owner.
///
/// The owner is held as a back-reference (`owner_id`) for navigation only;
/// the owner aggregate owns the pet. Visits are owned by the pet and are only
/// added through [`Pet::add_visit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: Option<PetId>,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub pet_type: Option<PetType>,
    pub owner_id: Option<OwnerId>,
    visits: Vec<Visit>,
}

impl Pet {
    /// A new, unsaved pet without visits.
    pub fn new() -> Self {
        Self {
            id: None,
            name: String::new(),
            birth_date: None,
            pet_type: None,
            owner_id: None,
            visits: Vec::new(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::new()
        }
    }

    /// Visits, most recent first.
    ///
    /// Recomputed on every call; visits sharing a date keep insertion order.
    pub fn visits(&self) -> Vec<&Visit> {
        let mut sorted: Vec<&Visit> = self.visits.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }

    /// Attach a visit to this pet, stamping it with this pet's id.
    ///
    /// A persisted visit replaces the held visit with the same id.
    pub fn add_visit(&mut self, mut visit: Visit) -> &Visit {
        visit.pet_id = self.id;
        let idx = match self.visits.iter().position(|v| v.same_identity(&visit)) {
            Some(idx) => {
                self.visits[idx] = visit;
                idx
            }
            None => {
                self.visits.push(visit);
                self.visits.len() - 1
            }
        };
        &self.visits[idx]
    }

    pub fn nr_of_visits(&self) -> usize {
        self.visits.len()
    }

    /// Storage-side access to held visits, in insertion order (identifier
    /// assignment on save).
    pub fn visits_mut(&mut self) -> impl Iterator<Item = &mut Visit> {
        self.visits.iter_mut()
    }
}

impl Default for Pet {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Pet {
    type Id = PetId;

    fn id(&self) -> Option<PetId> {
        self.id
    }
}

impl Named for Pet {
    fn name(&self) -> &str {
        &self.name
    }
}

impl core::fmt::Display for Pet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Pet form rules: name and birth date always required, type required on
/// creation.
impl Validate for Pet {
    fn validate(&self, errors: &mut Errors) {
        if self.name.is_empty() {
            errors.reject_value("name", codes::REQUIRED, "required");
        } else {
            validate_field(errors, "name", &self.name, &[Rule::MaxLength(30)]);
        }

        if self.is_new() && self.pet_type.is_none() {
            errors.reject_value("type", codes::REQUIRED, "required");
        }

        if self.birth_date.is_none() {
            errors.reject_value("birthDate", codes::REQUIRED, "required");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petclinic_core::{PetTypeId, VisitId};
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn saved_pet() -> Pet {
        let mut pet = Pet::named("Samantha");
        pet.id = Some(PetId::new(7));
        pet
    }

    #[test]
    fn add_visit_stamps_pet_id() {
        let mut pet = saved_pet();
        let visit = pet.add_visit(Visit::on(date(2013, 1, 1), "rabies shot"));
        assert_eq!(visit.pet_id, Some(PetId::new(7)));
        assert_eq!(pet.nr_of_visits(), 1);
    }

    #[test]
    fn visits_are_sorted_most_recent_first() {
        let mut pet = saved_pet();
        pet.add_visit(Visit::on(date(2013, 1, 2), "rabies shot"));
        pet.add_visit(Visit::on(date(2013, 1, 4), "spayed"));
        pet.add_visit(Visit::on(date(2013, 1, 3), "neutered"));

        let descriptions: Vec<&str> = pet.visits().iter().map(|v| v.description.as_str()).collect();
        assert_eq!(descriptions, vec!["spayed", "neutered", "rabies shot"]);
    }

    #[test]
    fn persisted_visit_is_replaced_not_duplicated() {
        let mut pet = saved_pet();
        let mut visit = Visit::on(date(2013, 1, 1), "rabies shot");
        visit.id = Some(VisitId::new(1));
        pet.add_visit(visit.clone());

        visit.description = "rabies booster".to_string();
        pet.add_visit(visit);

        assert_eq!(pet.nr_of_visits(), 1);
        assert_eq!(pet.visits()[0].description, "rabies booster");
    }

    #[test]
    fn validation_requires_name_type_and_birth_date_for_new_pet() {
        let errors = Pet::new().validated();
        assert!(errors.has_field_errors("name"));
        assert!(errors.has_field_errors("type"));
        assert!(errors.has_field_errors("birthDate"));
    }

    #[test]
    fn type_is_optional_when_editing() {
        let mut pet = saved_pet();
        pet.birth_date = Some(date(2010, 9, 7));
        assert!(!pet.validated().has_errors());

        let mut pet = Pet::named("Leo");
        pet.birth_date = Some(date(2010, 9, 7));
        pet.pet_type = Some(PetType::new(PetTypeId::new(1), "cat"));
        assert!(!pet.validated().has_errors());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: visits come out date-descending whatever the insertion order.
        #[test]
        fn visits_sorted_descending_for_any_insertion_order(
            days in prop::collection::vec(0i64..5_000, 0..20)
        ) {
            let mut pet = saved_pet();
            let base = date(2000, 1, 1);
            for d in &days {
                pet.add_visit(Visit::on(base + chrono::Duration::days(*d), "check-up"));
            }

            let visits = pet.visits();
            prop_assert_eq!(visits.len(), days.len());
            for pair in visits.windows(2) {
                prop_assert!(pair[0].date >= pair[1].date);
            }
        }
    }
}
