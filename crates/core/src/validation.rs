//! Field rules shared by every catalog aggregate.
//!
//! Lengths are counted in characters. Messages are stable: callers surface
//! them verbatim as validation details.

use crate::error::{DomainError, DomainResult};

/// Maximum length of an attribute or option name.
pub const ATTRIBUTE_NAME_MAX: usize = 100;

/// Maximum length of a category or product name.
pub const LONG_NAME_MAX: usize = 255;

/// Maximum length of any slug.
pub const SLUG_MAX: usize = 50;

/// Require a non-empty value no longer than `max` characters.
///
/// `field` is the label used in the message (e.g. `"name"`, `"option name"`).
pub fn require_text(field: &str, value: &str, max: usize) -> DomainResult<()> {
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }

    if value.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{field} is too long (max {max} characters)"
        )));
    }

    Ok(())
}

/// Validate a slug: required, at most [`SLUG_MAX`] characters, and matching
/// `^[a-z0-9]+(-[a-z0-9]+)*$`.
pub fn require_slug(field: &str, value: &str) -> DomainResult<()> {
    require_text(field, value, SLUG_MAX)?;

    if !is_slug(value) {
        return Err(DomainError::validation(format!(
            "{field} must contain only lowercase letters, numbers, and hyphens"
        )));
    }

    Ok(())
}

/// `true` when `value` is one or more `[a-z0-9]+` segments joined by single hyphens.
pub fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value.split('-').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        })
}

/// Reject negative sort orders.
pub fn require_non_negative(field: &str, value: i64) -> DomainResult<()> {
    if value < 0 {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}
