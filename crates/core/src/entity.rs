//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Identifiers are assigned by storage on first save, so a freshly built
/// entity has none and is considered *new*.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier, if one has been assigned.
    fn id(&self) -> Option<Self::Id>;

    /// Whether this entity has never been persisted.
    fn is_new(&self) -> bool {
        self.id().is_none()
    }

    /// Identity equality: both entities are persisted and share an identifier.
    ///
    /// Two new entities are never the same entity.
    fn same_identity(&self, other: &Self) -> bool {
        matches!((self.id(), other.id()), (Some(a), Some(b)) if a == b)
    }
}
