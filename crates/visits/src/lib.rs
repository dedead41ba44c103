//! Visits domain module: dated visit records attached to a pet.

pub mod visit;

pub use visit::Visit;
