use serde::{Deserialize, Serialize};

use petclinic_core::validation::{validate_field, Errors, Rule, Validate};
use petclinic_core::{cmp_ignore_case, eq_ignore_case, Entity, OwnerId, Person, PetId};

use crate::pet::Pet;

/// Aggregate root: a pet owner with contact details.
///
/// Pets are owned by the owner (saving the owner cascades to them) and are
/// only attached through [`Owner::add_pet`] (or, by the stores,
/// [`Owner::attach_loaded_pet`]), which keep the pet's back-reference in sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: Option<OwnerId>,
    pub person: Person,
    pub address: String,
    pub city: String,
    pub telephone: String,
    pets: Vec<Pet>,
}

impl Owner {
    /// A new, unsaved owner with no pets.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_name(&self) -> &str {
        &self.person.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.person.last_name
    }

    /// Pets ordered by name, case-insensitive ascending.
    pub fn pets(&self) -> Vec<&Pet> {
        let mut sorted: Vec<&Pet> = self.pets.iter().collect();
        sorted.sort_by(|a, b| cmp_ignore_case(&a.name, &b.name));
        sorted
    }

    pub fn nr_of_pets(&self) -> usize {
        self.pets.len()
    }

    /// Attach `pet` to this owner and point its back-reference here.
    ///
    /// Only a new pet grows the collection. A persisted pet replaces the held
    /// pet with the same id; a persisted pet this owner does not hold leaves
    /// the collection unchanged and `None` is returned.
    pub fn add_pet(&mut self, mut pet: Pet) -> Option<&mut Pet> {
        pet.owner_id = self.id;
        if pet.is_new() {
            self.pets.push(pet);
            return self.pets.last_mut();
        }
        let held = self.pets.iter_mut().find(|p| p.same_identity(&pet))?;
        *held = pet;
        Some(held)
    }

    /// Storage-side attach for pets read back from a store: replaces the held
    /// pet with the same id, or appends it.
    pub fn attach_loaded_pet(&mut self, mut pet: Pet) {
        pet.owner_id = self.id;
        match self.pets.iter_mut().find(|p| p.same_identity(&pet)) {
            Some(held) => *held = pet,
            None => self.pets.push(pet),
        }
    }

    /// First pet whose name matches `name` case-insensitively, saved or not.
    pub fn get_pet(&self, name: &str) -> Option<&Pet> {
        self.get_pet_ignore_new(name, false)
    }

    /// First pet whose name matches `name` case-insensitively.
    ///
    /// With `ignore_new`, unsaved pets are skipped; this is the lookup behind
    /// the duplicate-name check on pet creation.
    pub fn get_pet_ignore_new(&self, name: &str, ignore_new: bool) -> Option<&Pet> {
        self.pets
            .iter()
            .find(|p| (!ignore_new || !p.is_new()) && eq_ignore_case(&p.name, name))
    }

    pub fn pet_by_id(&self, id: PetId) -> Option<&Pet> {
        self.pets.iter().find(|p| p.id == Some(id))
    }

    /// Storage-side access to held pets, in insertion order (identifier
    /// assignment on cascading save).
    pub fn pets_mut(&mut self) -> impl Iterator<Item = &mut Pet> {
        self.pets.iter_mut()
    }

    /// Move the pets held by `other` into this owner (edit form submissions
    /// carry contact fields only).
    pub fn adopt_pets_from(&mut self, other: Owner) {
        for pet in other.pets {
            self.attach_loaded_pet(pet);
        }
    }
}

impl Entity for Owner {
    type Id = OwnerId;

    fn id(&self) -> Option<OwnerId> {
        self.id
    }
}

impl core::fmt::Display for Owner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Owner[id={:?}, new={}, lastName={}, firstName={}, address={}, city={}, telephone={}]",
            self.id.map(|id| id.get()),
            self.is_new(),
            self.person.last_name,
            self.person.first_name,
            self.address,
            self.city,
            self.telephone,
        )
    }
}

impl Validate for Owner {
    fn validate(&self, errors: &mut Errors) {
        validate_field(
            errors,
            "firstName",
            &self.person.first_name,
            &[Rule::NotEmpty, Rule::MaxLength(30)],
        );
        validate_field(
            errors,
            "lastName",
            &self.person.last_name,
            &[Rule::NotEmpty, Rule::MaxLength(30)],
        );
        validate_field(
            errors,
            "address",
            &self.address,
            &[Rule::NotEmpty, Rule::MaxLength(255)],
        );
        validate_field(errors, "city", &self.city, &[Rule::NotEmpty, Rule::MaxLength(80)]);
        validate_field(
            errors,
            "telephone",
            &self.telephone,
            &[
                Rule::NotEmpty,
                Rule::Digits {
                    integer: 10,
                    fraction: 0,
                },
                Rule::MaxLength(20),
            ],
        );
    }
}
