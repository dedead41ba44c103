//! In-memory store for tests/dev.
//!
//! Records are kept normalised (one map per table) and aggregates are
//! assembled on every read, so callers never share state with the store.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use petclinic_core::{Entity, OwnerId, Person, PetId, PetTypeId, VisitId};
use petclinic_owners::{Owner, Pet, PetType};
use petclinic_vets::Vet;
use petclinic_visits::Visit;

use super::{OwnerRepository, PetRepository, VetRepository, VisitRepository};
use crate::demo_data::DemoData;
use crate::error::{RepositoryError, RepositoryResult};

#[derive(Debug, Clone)]
struct OwnerRecord {
    person: Person,
    address: String,
    city: String,
    telephone: String,
}

#[derive(Debug, Clone)]
struct PetRecord {
    name: String,
    birth_date: Option<NaiveDate>,
    type_id: Option<PetTypeId>,
    owner_id: Option<OwnerId>,
}

#[derive(Debug, Default)]
struct State {
    owners: BTreeMap<OwnerId, OwnerRecord>,
    pets: BTreeMap<PetId, PetRecord>,
    visits: BTreeMap<VisitId, Visit>,
    pet_types: BTreeMap<PetTypeId, PetType>,
    vets: Vec<Vet>,
    owner_seq: i32,
    pet_seq: i32,
    visit_seq: i32,
}

/// In-memory implementation of every repository contract.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `data`, identifiers preserved.
    pub fn with_data(data: DemoData) -> RepositoryResult<Self> {
        let store = Self::new();
        {
            let mut state = store.write()?;
            for pet_type in data.pet_types {
                if let Some(id) = pet_type.id {
                    state.pet_types.insert(id, pet_type);
                }
            }
            state.vets = data.vets;
            for mut owner in data.owners {
                state.store_owner(&mut owner)?;
            }
        }
        Ok(store)
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, State>> {
        self.inner.read().map_err(|_| RepositoryError::Poisoned)
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, State>> {
        self.inner.write().map_err(|_| RepositoryError::Poisoned)
    }
}

/// Next identifier for a sequence, never below an explicitly stored id.
fn next_id(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

impl State {
    fn load_pet(&self, id: PetId) -> Option<Pet> {
        let record = self.pets.get(&id)?;
        let mut pet = Pet::named(record.name.clone());
        pet.id = Some(id);
        pet.birth_date = record.birth_date;
        pet.pet_type = record.type_id.and_then(|t| self.pet_types.get(&t).cloned());
        pet.owner_id = record.owner_id;
        for visit in self.visits.values().filter(|v| v.pet_id == Some(id)) {
            pet.add_visit(visit.clone());
        }
        Some(pet)
    }

    fn load_owner(&self, id: OwnerId) -> Option<Owner> {
        let record = self.owners.get(&id)?;
        let mut owner = Owner::new();
        owner.id = Some(id);
        owner.person = record.person.clone();
        owner.address = record.address.clone();
        owner.city = record.city.clone();
        owner.telephone = record.telephone.clone();
        let pet_ids: Vec<PetId> = self
            .pets
            .iter()
            .filter(|(_, p)| p.owner_id == Some(id))
            .map(|(pid, _)| *pid)
            .collect();
        for pet_id in pet_ids {
            if let Some(pet) = self.load_pet(pet_id) {
                owner.attach_loaded_pet(pet);
            }
        }
        Some(owner)
    }

    fn store_owner(&mut self, owner: &mut Owner) -> RepositoryResult<()> {
        let id = match owner.id {
            Some(id) if self.owners.contains_key(&id) || id.get() > self.owner_seq => {
                self.owner_seq = self.owner_seq.max(id.get());
                id
            }
            Some(id) => return Err(RepositoryError::NotFound(format!("owner {id}"))),
            None => OwnerId::new(next_id(&mut self.owner_seq)),
        };
        owner.id = Some(id);
        self.owners.insert(
            id,
            OwnerRecord {
                person: owner.person.clone(),
                address: owner.address.clone(),
                city: owner.city.clone(),
                telephone: owner.telephone.clone(),
            },
        );
        for pet in owner.pets_mut() {
            pet.owner_id = Some(id);
            self.store_pet(pet)?;
        }
        Ok(())
    }

    fn store_pet(&mut self, pet: &mut Pet) -> RepositoryResult<()> {
        let existing_type = pet
            .id
            .and_then(|id| self.pets.get(&id))
            .and_then(|r| r.type_id);
        let id = match pet.id {
            Some(id) if self.pets.contains_key(&id) || id.get() > self.pet_seq => {
                self.pet_seq = self.pet_seq.max(id.get());
                id
            }
            Some(id) => return Err(RepositoryError::NotFound(format!("pet {id}"))),
            None => PetId::new(next_id(&mut self.pet_seq)),
        };
        let type_id = match &pet.pet_type {
            Some(t) => Some(t.id.ok_or_else(|| {
                RepositoryError::InvalidRecord("pet type must be saved before use".to_string())
            })?),
            None => existing_type,
        };
        pet.id = Some(id);
        self.pets.insert(
            id,
            PetRecord {
                name: pet.name.clone(),
                birth_date: pet.birth_date,
                type_id,
                owner_id: pet.owner_id,
            },
        );
        for visit in pet.visits_mut() {
            visit.pet_id = Some(id);
            self.store_visit(visit)?;
        }
        Ok(())
    }

    fn store_visit(&mut self, visit: &mut Visit) -> RepositoryResult<()> {
        let id = match visit.id {
            Some(id) if self.visits.contains_key(&id) || id.get() > self.visit_seq => {
                self.visit_seq = self.visit_seq.max(id.get());
                id
            }
            Some(id) => return Err(RepositoryError::NotFound(format!("visit {id}"))),
            None => VisitId::new(next_id(&mut self.visit_seq)),
        };
        visit.id = Some(id);
        self.visits.insert(id, visit.clone());
        Ok(())
    }
}

#[async_trait]
impl OwnerRepository for InMemoryStore {
    async fn find_by_last_name(&self, last_name: &str) -> RepositoryResult<Vec<Owner>> {
        let state = self.read()?;
        let owners = state
            .owners
            .iter()
            .filter(|(_, o)| o.person.last_name.starts_with(last_name))
            .filter_map(|(id, _)| state.load_owner(*id))
            .collect();
        Ok(owners)
    }

    async fn find_by_id(&self, id: OwnerId) -> RepositoryResult<Option<Owner>> {
        Ok(self.read()?.load_owner(id))
    }

    async fn save(&self, mut owner: Owner) -> RepositoryResult<Owner> {
        self.write()?.store_owner(&mut owner)?;
        tracing::debug!(owner_id = ?owner.id(), pets = owner.nr_of_pets(), "owner stored in memory");
        Ok(owner)
    }
}

#[async_trait]
impl PetRepository for InMemoryStore {
    async fn find_pet_types(&self) -> RepositoryResult<Vec<PetType>> {
        let mut types: Vec<PetType> = self.read()?.pet_types.values().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn find_by_id(&self, id: PetId) -> RepositoryResult<Option<Pet>> {
        Ok(self.read()?.load_pet(id))
    }

    async fn save(&self, mut pet: Pet) -> RepositoryResult<Pet> {
        self.write()?.store_pet(&mut pet)?;
        Ok(pet)
    }
}

#[async_trait]
impl VisitRepository for InMemoryStore {
    async fn find_by_pet_id(&self, pet_id: PetId) -> RepositoryResult<Vec<Visit>> {
        let state = self.read()?;
        Ok(state
            .visits
            .values()
            .filter(|v| v.pet_id == Some(pet_id))
            .cloned()
            .collect())
    }

    async fn save(&self, mut visit: Visit) -> RepositoryResult<Visit> {
        if visit.pet_id.is_none() {
            return Err(RepositoryError::InvalidRecord("visit has no pet".to_string()));
        }
        self.write()?.store_visit(&mut visit)?;
        Ok(visit)
    }
}

#[async_trait]
impl VetRepository for InMemoryStore {
    async fn find_all(&self) -> RepositoryResult<Vec<Vet>> {
        Ok(self.read()?.vets.clone())
    }
}
