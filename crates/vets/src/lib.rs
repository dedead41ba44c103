//! Vets domain module: veterinarians and their specialties.

pub mod specialty;
pub mod vet;

pub use specialty::Specialty;
pub use vet::Vet;
