//! Shared naming fields, composed into entities instead of inherited.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Capability: an entity that is presented by its name (pet types,
/// specialties, pets).
pub trait Named {
    fn name(&self) -> &str;
}

/// First/last name pair embedded by owners and vets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
}

impl Person {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// Case-insensitive string equality (Unicode lowercase folding).
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    cmp_ignore_case(a, b) == Ordering::Equal
}

/// Case-insensitive ordering used by every name-sorted listing.
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_case_when_comparing() {
        assert!(eq_ignore_case("Leo", "lEO"));
        assert!(!eq_ignore_case("Leo", "Leon"));
        assert_eq!(cmp_ignore_case("basil", "Leo"), Ordering::Less);
        assert_eq!(cmp_ignore_case("Zed", "alpha"), Ordering::Greater);
    }
}
