//! Owners domain module: owners, their pets and the pet-type lookup.
//!
//! This crate contains business rules for the owner aggregate, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod owner;
pub mod pet;
pub mod pet_type;

pub use owner::Owner;
pub use pet::Pet;
pub use pet_type::PetType;
