//! `petclinic-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! entity identity, composed person/name fields, domain errors and the
//! field-level validation rules shared by every form.

pub mod entity;
pub mod error;
pub mod id;
pub mod named;
pub mod validation;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{OwnerId, PetId, PetTypeId, SpecialtyId, VetId, VisitId};
pub use named::{Named, Person, eq_ignore_case, cmp_ignore_case};
pub use validation::{Errors, FieldError, Rule, Validate};
