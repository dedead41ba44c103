use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use petclinic_core::validation::codes;
use petclinic_core::{Entity, Errors, Named, Person};
use petclinic_owners::{Owner, Pet, PetType};
use petclinic_vets::{Specialty, Vet};
use petclinic_visits::Visit;

// -------------------------
// Form DTOs
// -------------------------
//
// Identifiers are never bound from form input; they come from the path.

#[derive(Debug, Default, Deserialize)]
pub struct FindOwnersQuery {
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OwnerForm {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub telephone: String,
}

impl OwnerForm {
    pub fn into_owner(self) -> Owner {
        let mut owner = Owner::new();
        owner.person = Person::new(self.first_name, self.last_name);
        owner.address = self.address;
        owner.city = self.city;
        owner.telephone = self.telephone;
        owner
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PetForm {
    pub name: String,
    pub birth_date: String,
    #[serde(rename = "type")]
    pub pet_type: String,
}

impl PetForm {
    /// Bind onto a fresh pet, resolving the type by name against `types`.
    ///
    /// Unparseable input is recorded as `typeMismatch` and leaves the field
    /// unset.
    pub fn bind(self, types: &[PetType], errors: &mut Errors) -> Pet {
        let mut pet = Pet::named(self.name);

        match parse_form_date(&self.birth_date) {
            Ok(date) => pet.birth_date = date,
            Err(()) => reject_mismatch(errors, "birthDate", &self.birth_date),
        }

        let type_name = self.pet_type.trim();
        if !type_name.is_empty() {
            match types.iter().find(|t| t.name() == type_name) {
                Some(found) => pet.pet_type = Some(found.clone()),
                None => reject_mismatch(errors, "type", type_name),
            }
        }
        pet
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VisitForm {
    pub date: String,
    pub description: String,
}

impl VisitForm {
    /// Bind onto a new visit; a blank date keeps today's default.
    pub fn bind(self, errors: &mut Errors) -> Visit {
        let mut visit = Visit::new();
        visit.description = self.description;
        match parse_form_date(&self.date) {
            Ok(Some(date)) => visit.date = date,
            Ok(None) => {}
            Err(()) => reject_mismatch(errors, "date", &self.date),
        }
        visit
    }
}

/// Accepts `yyyy/MM/dd` (form format) and `yyyy-MM-dd`; blank is no value.
pub fn parse_form_date(raw: &str) -> Result<Option<NaiveDate>, ()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map(Some)
        .map_err(|_| ())
}

fn reject_mismatch(errors: &mut Errors, field: &str, value: &str) {
    errors.reject_value(
        field,
        codes::TYPE_MISMATCH,
        format!("invalid value '{value}'"),
    );
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn owner_to_json(owner: &Owner) -> Value {
    json!({
        "id": owner.id().map(|id| id.get()),
        "new": owner.is_new(),
        "firstName": owner.first_name(),
        "lastName": owner.last_name(),
        "address": owner.address,
        "city": owner.city,
        "telephone": owner.telephone,
        "pets": owner.pets().into_iter().map(pet_to_json).collect::<Vec<_>>(),
    })
}

pub fn pet_to_json(pet: &Pet) -> Value {
    json!({
        "id": pet.id().map(|id| id.get()),
        "new": pet.is_new(),
        "name": pet.name,
        "birthDate": pet.birth_date.map(|d| d.to_string()),
        "type": pet.pet_type.as_ref().map(|t| t.name().to_string()),
        "ownerId": pet.owner_id.map(|id| id.get()),
        "visits": pet.visits().into_iter().map(visit_to_json).collect::<Vec<_>>(),
    })
}

pub fn visit_to_json(visit: &Visit) -> Value {
    json!({
        "id": visit.id().map(|id| id.get()),
        "date": visit.date.to_string(),
        "description": visit.description,
        "petId": visit.pet_id.map(|id| id.get()),
    })
}

pub fn pet_type_to_json(pet_type: &PetType) -> Value {
    json!({
        "id": pet_type.id().map(|id| id.get()),
        "name": pet_type.name(),
    })
}

pub fn specialty_to_json(specialty: &Specialty) -> Value {
    json!({
        "id": specialty.id().map(|id| id.get()),
        "name": specialty.name(),
    })
}

pub fn vet_to_json(vet: &Vet) -> Value {
    json!({
        "id": vet.id().map(|id| id.get()),
        "firstName": vet.first_name(),
        "lastName": vet.last_name(),
        "specialties": vet.specialties().into_iter().map(specialty_to_json).collect::<Vec<_>>(),
        "nrOfSpecialties": vet.nr_of_specialties(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use petclinic_core::{OwnerId, PetTypeId};

    fn types() -> Vec<PetType> {
        vec![
            PetType::new(PetTypeId::new(1), "cat"),
            PetType::new(PetTypeId::new(2), "dog"),
        ]
    }

    #[test]
    fn form_dates_accept_both_separators() {
        let expected = NaiveDate::from_ymd_opt(2015, 2, 1);
        assert_eq!(parse_form_date("2015/02/01"), Ok(expected));
        assert_eq!(parse_form_date("2015-02-01"), Ok(expected));
        assert_eq!(parse_form_date("  "), Ok(None));
        assert!(parse_form_date("01.02.2015").is_err());
    }

    #[test]
    fn pet_form_resolves_type_by_name() {
        let mut errors = Errors::new();
        let pet = PetForm {
            name: "Bowser".to_string(),
            birth_date: "2015/02/01".to_string(),
            pet_type: "dog".to_string(),
        }
        .bind(&types(), &mut errors);

        assert!(errors.is_empty());
        assert_eq!(pet.pet_type.as_ref().map(|t| t.id), Some(Some(PetTypeId::new(2))));
        assert!(pet.is_new());
    }

    #[test]
    fn unknown_type_and_bad_date_are_type_mismatches() {
        let mut errors = Errors::new();
        let pet = PetForm {
            name: "Bowser".to_string(),
            birth_date: "someday".to_string(),
            pet_type: "dragon".to_string(),
        }
        .bind(&types(), &mut errors);

        assert!(pet.pet_type.is_none());
        assert!(pet.birth_date.is_none());
        let found: Vec<&str> = errors.iter().map(|e| e.code).collect();
        assert_eq!(found, vec![codes::TYPE_MISMATCH, codes::TYPE_MISMATCH]);
        assert!(errors.has_field_errors("type"));
        assert!(errors.has_field_errors("birthDate"));
    }

    #[test]
    fn blank_visit_date_keeps_today() {
        let mut errors = Errors::new();
        let visit = VisitForm {
            date: String::new(),
            description: "check-up".to_string(),
        }
        .bind(&mut errors);
        assert!(errors.is_empty());
        assert_eq!(visit.date, Visit::new().date);
    }

    #[test]
    fn owner_json_lists_pets_sorted() {
        let mut owner = OwnerForm {
            first_name: "George".to_string(),
            last_name: "Franklin".to_string(),
            ..OwnerForm::default()
        }
        .into_owner();
        owner.id = Some(OwnerId::new(1));
        owner.add_pet(Pet::named("Leo"));
        owner.add_pet(Pet::named("Basil"));

        let json = owner_to_json(&owner);
        assert_eq!(json["id"], 1);
        assert_eq!(json["pets"][0]["name"], "Basil");
        assert_eq!(json["pets"][1]["ownerId"], 1);
    }
}
