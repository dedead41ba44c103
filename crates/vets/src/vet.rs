use serde::{Deserialize, Serialize};

use petclinic_core::{cmp_ignore_case, Entity, Person, VetId};

use crate::specialty::Specialty;

/// Aggregate root: a veterinarian and the specialties they practise.
///
/// Specialties have set semantics: adding one that is already held is a
/// no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vet {
    pub id: Option<VetId>,
    pub person: Person,
    specialties: Vec<Specialty>,
}

impl Vet {
    pub fn new(person: Person) -> Self {
        Self {
            id: None,
            person,
            specialties: Vec::new(),
        }
    }

    pub fn first_name(&self) -> &str {
        &self.person.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.person.last_name
    }

    /// Specialties ordered by name, case-insensitive ascending.
    pub fn specialties(&self) -> Vec<&Specialty> {
        let mut sorted: Vec<&Specialty> = self.specialties.iter().collect();
        sorted.sort_by(|a, b| cmp_ignore_case(&a.name, &b.name));
        sorted
    }

    pub fn nr_of_specialties(&self) -> usize {
        self.specialties.len()
    }

    /// Add a specialty unless an equal one (same identity, or same unsaved
    /// value) is already held.
    pub fn add_specialty(&mut self, specialty: Specialty) {
        let held = self.specialties.iter().any(|s| {
            s.same_identity(&specialty) || (specialty.is_new() && *s == specialty)
        });
        if !held {
            self.specialties.push(specialty);
        }
    }
}

impl Entity for Vet {
    type Id = VetId;

    fn id(&self) -> Option<VetId> {
        self.id
    }
}
