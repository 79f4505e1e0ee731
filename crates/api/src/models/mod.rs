//! Domain models for the listing API.
//!
//! These types represent validated domain objects separate from database row
//! types, plus the allow-listed request bodies that create or patch them.

pub mod property;
pub mod user;

pub use property::{Property, PropertyFilters, PropertyInput};
pub use user::{NewUser, User, UserChanges, UserPatch};

use thiserror::Error;

/// A request body failed shape or content validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The body could not be decoded into the expected shape.
    #[error("{0}")]
    Body(String),

    /// A required field was missing or blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// An email field was not a valid address.
    #[error("invalid {field}: {source}")]
    InvalidEmail {
        field: &'static str,
        source: homestead_core::EmailError,
    },

    /// A coordinate was not a number inside its range.
    #[error("{field} must be a number between -{max} and {max} (got {value:?})")]
    InvalidCoordinate {
        field: &'static str,
        max: u8,
        value: String,
    },

    /// An image URL was not an absolute http(s) URL.
    #[error("invalid image URL: {0}")]
    InvalidUrl(String),

    /// A counter was negative.
    #[error("{0} cannot be negative")]
    Negative(&'static str),

    /// A field that clients cannot change was present in a patch.
    #[error("{0} cannot be updated directly")]
    ReadOnly(&'static str),
}

/// Reject missing or whitespace-only text.
pub(crate) fn require_text(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}
