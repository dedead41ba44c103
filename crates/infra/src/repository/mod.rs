//! Repository contracts and their storage backends.
//!
//! Repositories load and persist whole aggregates: loading an owner loads its
//! pets (and their visits), saving an owner cascades to them.

use async_trait::async_trait;

use petclinic_core::{OwnerId, PetId};
use petclinic_owners::{Owner, Pet, PetType};
use petclinic_vets::Vet;
use petclinic_visits::Visit;

use crate::error::RepositoryResult;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

#[async_trait]
pub trait OwnerRepository: Send + Sync {
    /// Owners whose last name *starts* with `last_name` (empty matches all),
    /// with pets loaded.
    async fn find_by_last_name(&self, last_name: &str) -> RepositoryResult<Vec<Owner>>;

    /// One owner with pets loaded.
    async fn find_by_id(&self, id: OwnerId) -> RepositoryResult<Option<Owner>>;

    /// Insert or update `owner`, cascading to its pets and their visits.
    /// Returns the owner with every identifier assigned.
    async fn save(&self, owner: Owner) -> RepositoryResult<Owner>;
}

#[async_trait]
pub trait PetRepository: Send + Sync {
    /// All pet types ordered by name.
    async fn find_pet_types(&self) -> RepositoryResult<Vec<PetType>>;

    /// One pet with its type and visits loaded.
    async fn find_by_id(&self, id: PetId) -> RepositoryResult<Option<Pet>>;

    /// Insert or update `pet`, cascading to its visits.
    async fn save(&self, pet: Pet) -> RepositoryResult<Pet>;
}

#[async_trait]
pub trait VisitRepository: Send + Sync {
    async fn find_by_pet_id(&self, pet_id: PetId) -> RepositoryResult<Vec<Visit>>;

    async fn save(&self, visit: Visit) -> RepositoryResult<Visit>;
}

#[async_trait]
pub trait VetRepository: Send + Sync {
    /// All vets with their specialties loaded.
    async fn find_all(&self) -> RepositoryResult<Vec<Vet>>;
}

/// Escape `LIKE` metacharacters so a search prefix matches literally.
pub(crate) fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::like_prefix;

    #[test]
    fn like_prefix_escapes_wildcards() {
        assert_eq!(like_prefix(""), "%");
        assert_eq!(like_prefix("Dav"), "Dav%");
        assert_eq!(like_prefix("50%_"), "50\\%\\_%");
    }
}
