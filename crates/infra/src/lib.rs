//! Infrastructure layer: storage backends, schema, demo data, config.

pub mod config;
pub mod demo_data;
pub mod error;
pub mod repository;

pub use error::{RepositoryError, RepositoryResult};
pub use repository::{
    InMemoryStore, OwnerRepository, PetRepository, PostgresStore, VetRepository, VisitRepository,
};
