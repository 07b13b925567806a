//! Field-level validation for request entities.
//!
//! Each entity implements [`Validate`] by running its fields through a
//! [`Validator`] in a fixed order. The result is an ordered list of
//! [`FieldError`]s, so callers can report the first failing field
//! deterministically.
//!
//! ```
//! use emporium_core::validation::{Validate, ValidationErrors, Validator};
//!
//! struct Login {
//!     username: String,
//!     password: String,
//! }
//!
//! impl Validate for Login {
//!     fn validate(&self) -> Result<(), ValidationErrors> {
//!         Validator::new()
//!             .required("username", &self.username)
//!             .required("password", &self.password)
//!             .finish()
//!     }
//! }
//!
//! let err = Login { username: "ann".into(), password: String::new() }
//!     .validate()
//!     .unwrap_err();
//! assert_eq!(err.first().field, "password");
//! ```

use core::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::Email;

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `address.city`.
    pub field: String,
    /// Human readable description of the failed rule.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// A non-empty, ordered list of field errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    first: FieldError,
    rest: Vec<FieldError>,
}

impl ValidationErrors {
    /// Build an error list holding a single failure.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            first: FieldError::new(field, message),
            rest: Vec::new(),
        }
    }

    fn from_vec(errors: Vec<FieldError>) -> Option<Self> {
        let mut iter = errors.into_iter();
        let first = iter.next()?;
        Some(Self {
            first,
            rest: iter.collect(),
        })
    }

    /// The first failing field, in declaration order.
    #[must_use]
    pub const fn first(&self) -> &FieldError {
        &self.first
    }

    /// All failures in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }

    /// Number of failed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    /// Always false; present for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Whether `field` is among the failures.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        if !self.rest.is_empty() {
            write!(f, " (and {} more)", self.rest.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Entities that can check their own field rules.
pub trait Validate {
    /// Run every rule, returning all failures in field order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] if any rule fails.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Collects field errors. A field that already failed is not checked again,
/// so `required` followed by `length` reports only the missing value.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    /// Start an empty validation pass.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn failed(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn check(&mut self, field: &str, ok: bool, message: impl FnOnce() -> String) -> &mut Self {
        if !ok && !self.failed(field) {
            self.errors.push(FieldError::new(field, message()));
        }
        self
    }

    /// The value must contain something other than whitespace.
    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(field, !value.trim().is_empty(), || "is required".to_owned())
    }

    /// Character count must lie within `min..=max`.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        self.min_length(field, value, min).max_length(field, value, max)
    }

    /// At least `min` characters.
    pub fn min_length(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        self.check(field, value.chars().count() >= min, || {
            format!("must be at least {min} characters")
        })
    }

    /// At most `max` characters.
    pub fn max_length(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        self.check(field, value.chars().count() <= max, || {
            format!("must be at most {max} characters")
        })
    }

    /// Structurally valid email address.
    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(field, Email::parse(value).is_ok(), || {
            "must be a valid email address".to_owned()
        })
    }

    /// Absolute `http` or `https` URL with a host.
    pub fn url(&mut self, field: &str, value: &str) -> &mut Self {
        let ok = url::Url::parse(value)
            .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some());
        self.check(field, ok, || "must be a valid http(s) URL".to_owned())
    }

    /// Strictly greater than zero.
    pub fn positive(&mut self, field: &str, value: Decimal) -> &mut Self {
        self.check(field, value > Decimal::ZERO, || {
            "must be greater than 0".to_owned()
        })
    }

    /// Zero or more.
    pub fn non_negative(&mut self, field: &str, value: Decimal) -> &mut Self {
        self.check(field, value >= Decimal::ZERO, || {
            "must not be negative".to_owned()
        })
    }

    /// Money amount representable as `NUMERIC(precision, scale)`: at most
    /// `scale` decimal places and `precision - scale` integer digits.
    pub fn money(&mut self, field: &str, value: Decimal, precision: u32, scale: u32) -> &mut Self {
        let integer_digits = precision.saturating_sub(scale);
        let fits = value.normalize().scale() <= scale
            && value.trunc().abs().to_string().trim_start_matches('0').len()
                <= integer_digits as usize;
        self.check(field, fits, || {
            format!(
                "must have at most {integer_digits} digits before and {scale} after the decimal point"
            )
        })
    }

    /// Inclusive numeric range. `NaN` always fails.
    pub fn range(&mut self, field: &str, value: f64, min: f64, max: f64) -> &mut Self {
        self.check(field, (min..=max).contains(&value), || {
            format!("must be between {min} and {max}")
        })
    }

    /// Collection with at least one element.
    pub fn not_empty<T>(&mut self, field: &str, values: &[T]) -> &mut Self {
        self.check(field, !values.is_empty(), || {
            "must contain at least one item".to_owned()
        })
    }

    /// Custom rule: record `message` against `field` unless `ok`.
    pub fn rule(&mut self, field: &str, ok: bool, message: &str) -> &mut Self {
        self.check(field, ok, || message.to_owned())
    }

    /// Merge a nested entity's result, prefixing its field names.
    pub fn nested(&mut self, prefix: &str, result: Result<(), ValidationErrors>) -> &mut Self {
        if let Err(errors) = result {
            for e in errors.iter() {
                let field = format!("{prefix}.{}", e.field);
                if !self.failed(&field) {
                    self.errors.push(FieldError::new(field, e.message.clone()));
                }
            }
        }
        self
    }

    /// Finish the pass.
    ///
    /// # Errors
    ///
    /// Returns every collected failure in the order the rules ran.
    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        ValidationErrors::from_vec(std::mem::take(&mut self.errors)).map_or(Ok(()), Err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pass_is_ok() {
        assert!(Validator::new().finish().is_ok());
    }

    #[test]
    fn test_required_rejects_blank() {
        let err = Validator::new().required("name", "   ").finish().unwrap_err();
        assert_eq!(err.first(), &FieldError::new("name", "is required"));
    }

    #[test]
    fn test_only_first_rule_per_field_reported() {
        let err = Validator::new()
            .required("password", "")
            .min_length("password", "", 8)
            .finish()
            .unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.first().message, "is required");
    }

    #[test]
    fn test_order_is_preserved() {
        let err = Validator::new()
            .length("username", "ab", 3, 20)
            .min_length("password", "short", 8)
            .email("email", "nope")
            .finish()
            .unwrap_err();
        let fields: Vec<_> = err.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["username", "password", "email"]);
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        assert!(Validator::new().length("name", "héé", 3, 3).finish().is_ok());
        let err = Validator::new()
            .max_length("name", "abcd", 3)
            .finish()
            .unwrap_err();
        assert_eq!(err.first().message, "must be at most 3 characters");
    }

    #[test]
    fn test_url_rule() {
        assert!(Validator::new().url("image", "https://cdn.example.com/a.png").finish().is_ok());
        assert!(Validator::new().url("image", "ftp://example.com/a.png").finish().is_err());
        assert!(Validator::new().url("image", "not a url").finish().is_err());
    }

    #[test]
    fn test_numeric_rules() {
        assert!(Validator::new().positive("price", Decimal::ZERO).finish().is_err());
        assert!(Validator::new().positive("price", Decimal::new(1, 2)).finish().is_ok());
        assert!(Validator::new().non_negative("total", Decimal::ZERO).finish().is_ok());
        assert!(Validator::new().non_negative("total", Decimal::NEGATIVE_ONE).finish().is_err());
        assert!(Validator::new().range("rating", 5.0, 0.0, 5.0).finish().is_ok());
        assert!(Validator::new().range("rating", 5.1, 0.0, 5.0).finish().is_err());
        assert!(Validator::new().range("rating", f64::NAN, 0.0, 5.0).finish().is_err());
    }

    #[test]
    fn test_money_rule() {
        let fits = |v: Decimal| Validator::new().money("price", v, 12, 2).finish().is_ok();
        assert!(fits(Decimal::new(1999, 2)));
        assert!(fits(Decimal::new(19_990, 3)));
        assert!(fits(Decimal::new(999_999_999_999, 2)));
        assert!(!fits(Decimal::new(1, 3)));
        assert!(!fits(Decimal::new(1_000_000_000_000, 0)));
        assert!(!fits(Decimal::new(10_000_000_000, 0)));
    }

    #[test]
    fn test_not_empty_rule() {
        let empty: [u8; 0] = [];
        assert!(Validator::new().not_empty("items", &empty).finish().is_err());
        assert!(Validator::new().not_empty("items", &[1]).finish().is_ok());
    }

    #[test]
    fn test_nested_prefixes_fields() {
        let inner = Validator::new().required("city", "").finish();
        let err = Validator::new()
            .required("name", "Ann")
            .nested("address", inner)
            .finish()
            .unwrap_err();
        assert_eq!(err.first().field, "address.city");
        assert!(err.contains("address.city"));
    }

    #[test]
    fn test_display_mentions_extra_count() {
        let err = Validator::new()
            .required("a", "")
            .required("b", "")
            .finish()
            .unwrap_err();
        assert_eq!(err.to_string(), "a is required (and 1 more)");
    }
}
