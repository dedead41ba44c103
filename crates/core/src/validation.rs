//! Field-level validation: an explicit rule list evaluated by plain calls.
//!
//! Forms collect failures into [`Errors`], keyed by field name. A failure is
//! never fatal; handlers re-render the form with the collected errors.

use std::collections::BTreeMap;

use serde::Serialize;

/// Error codes attached to field errors.
pub mod codes {
    pub const REQUIRED: &str = "required";
    pub const DIGITS: &str = "digits";
    pub const MAX_LENGTH: &str = "maxLength";
    pub const DUPLICATE: &str = "duplicate";
    pub const NOT_FOUND: &str = "notFound";
    pub const TYPE_MISMATCH: &str = "typeMismatch";
}

/// A single field-scoped failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: &'static str,
    pub message: String,
}

/// Accumulated field errors for one bound form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Errors {
    errors: Vec<FieldError>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn reject_value(
        &mut self,
        field: impl Into<String>,
        code: &'static str,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldError {
            field: field.into(),
            code,
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_field_errors(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages grouped by field, in field-name order (view model shape).
    pub fn by_field(&self) -> BTreeMap<String, Vec<String>> {
        let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for e in &self.errors {
            out.entry(e.field.clone()).or_default().push(e.message.clone());
        }
        out
    }

    pub fn merge(&mut self, other: Errors) {
        self.errors.extend(other.errors);
    }
}

/// A declarative constraint on a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The value must not be empty.
    NotEmpty,
    /// The value must be a number with at most `integer` integer digits and
    /// `fraction` fractional digits. Empty values are left to `NotEmpty`.
    Digits { integer: usize, fraction: usize },
    /// The value must have at most this many characters.
    MaxLength(usize),
}

impl Rule {
    /// Evaluate the rule, returning `(code, message)` on failure.
    pub fn check(&self, value: &str) -> Option<(&'static str, String)> {
        match *self {
            Rule::NotEmpty => value
                .is_empty()
                .then(|| (codes::REQUIRED, "must not be empty".to_string())),
            Rule::Digits { integer, fraction } => {
                if value.is_empty() || digits_within(value, integer, fraction) {
                    None
                } else {
                    Some((
                        codes::DIGITS,
                        format!(
                            "numeric value out of bounds (<{integer} digits>.<{fraction} digits> expected)"
                        ),
                    ))
                }
            }
            Rule::MaxLength(max) => (value.chars().count() > max)
                .then(|| (codes::MAX_LENGTH, format!("size must be between 0 and {max}"))),
        }
    }
}

fn digits_within(value: &str, integer: usize, fraction: usize) -> bool {
    let unsigned = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let significant_int = int_part.trim_start_matches('0').len();
    let significant_frac = frac_part.trim_end_matches('0').len();
    significant_int <= integer && significant_frac <= fraction
}

/// Apply `rules` to one field value, recording every failure.
pub fn validate_field(errors: &mut Errors, field: &str, value: &str, rules: &[Rule]) {
    for rule in rules {
        if let Some((code, message)) = rule.check(value) {
            errors.reject_value(field, code, message);
        }
    }
}

/// Types that can validate themselves into an [`Errors`] collection.
pub trait Validate {
    fn validate(&self, errors: &mut Errors);

    fn validated(&self) -> Errors {
        let mut errors = Errors::new();
        self.validate(&mut errors);
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PHONE: Rule = Rule::Digits { integer: 10, fraction: 0 };

    #[test]
    fn not_empty_rejects_empty_string() {
        assert_eq!(Rule::NotEmpty.check("").map(|(c, _)| c), Some(codes::REQUIRED));
        assert!(Rule::NotEmpty.check(" x").is_none());
    }

    #[test]
    fn digits_accepts_ten_digit_phone() {
        assert!(PHONE.check("6085551023").is_none());
        assert!(PHONE.check("006085551023").is_none());
    }

    #[test]
    fn digits_rejects_long_or_non_numeric_values() {
        assert_eq!(PHONE.check("60855510231").map(|(c, _)| c), Some(codes::DIGITS));
        assert_eq!(PHONE.check("608-555-1023").map(|(c, _)| c), Some(codes::DIGITS));
        assert_eq!(PHONE.check("608555.5").map(|(c, _)| c), Some(codes::DIGITS));
        assert!(PHONE.check("").is_none());
    }

    #[test]
    fn max_length_counts_characters() {
        assert!(Rule::MaxLength(3).check("äöü").is_none());
        assert!(Rule::MaxLength(3).check("abcd").is_some());
    }

    #[test]
    fn errors_group_messages_by_field() {
        let mut errors = Errors::new();
        validate_field(&mut errors, "telephone", "12ab", &[Rule::NotEmpty, PHONE]);
        validate_field(&mut errors, "city", "", &[Rule::NotEmpty]);
        errors.reject_value("telephone", codes::DUPLICATE, "already exists");

        assert!(errors.has_errors());
        assert!(errors.has_field_errors("city"));
        assert!(!errors.has_field_errors("address"));
        let grouped = errors.by_field();
        assert_eq!(grouped["telephone"].len(), 2);
        assert_eq!(grouped["city"], vec!["must not be empty".to_string()]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: up to ten significant digits pass, eleven never do.
        #[test]
        fn phone_digits_bound(number in "[1-9][0-9]{0,9}", extra in "[0-9]") {
            prop_assert!(PHONE.check(&number).is_none());
            let longer = format!("{number}{extra}");
            prop_assert_eq!(PHONE.check(&longer).is_some(), number.len() == 10);
        }
    }
}
