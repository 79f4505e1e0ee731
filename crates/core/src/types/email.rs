//! Account and contact email addresses.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a string was rejected as an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,

    #[error("email must be at most {max} characters")]
    TooLong { max: usize },

    #[error("email cannot contain whitespace")]
    Whitespace,

    #[error("email must contain exactly one @")]
    AtSymbol,

    #[error("email needs a name before the @")]
    MissingMailbox,

    #[error("email domain {0:?} is not valid")]
    InvalidDomain(String),
}

/// A syntactically plausible email address.
///
/// The address must have a single `@`, a non-empty mailbox, and a dotted
/// domain with no empty labels (`ada@example.com`, not `ada@localhost`).
/// Deliverability is never checked.
///
/// Users log in by email regardless of case, so account emails go through
/// [`Email::normalized`]. Contact emails on listings keep the casing the
/// agent typed and use [`Email::parse`].
///
/// ```
/// use homestead_core::Email;
///
/// let email = Email::normalized("  Ada@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "ada@example.com");
///
/// assert!(Email::parse("ada@localhost").is_err());
/// assert!(Email::parse("ada@@example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Longest address accepted (RFC 5321 path limit).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an address exactly as given.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` describing the first rule the input breaks.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (mailbox, domain) = s.split_once('@').ok_or(EmailError::AtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::AtSymbol);
        }
        if mailbox.is_empty() {
            return Err(EmailError::MissingMailbox);
        }
        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(EmailError::InvalidDomain(domain.to_owned()));
        }

        Ok(Self(s.to_owned()))
    }

    /// Trim and lower-case `s`, then parse it.
    ///
    /// # Errors
    ///
    /// Same as [`Email::parse`].
    pub fn normalized(s: &str) -> Result<Self, EmailError> {
        Self::parse(&s.trim().to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Email {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

// Stored values were validated on the way in.
#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Email {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<String as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Email {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_listing_contacts() {
        for raw in ["agent@homestead.test", "j.doe+lofts@mail.example.co.uk", "a@b.c"] {
            assert_eq!(Email::parse(raw).unwrap().as_str(), raw);
        }
    }

    #[test]
    fn test_rejects_each_rule() {
        let cases = [
            ("", EmailError::Empty),
            ("ada lovelace@example.com", EmailError::Whitespace),
            ("not-an-email", EmailError::AtSymbol),
            ("ada@home@example.com", EmailError::AtSymbol),
            ("@example.com", EmailError::MissingMailbox),
            ("ada@localhost", EmailError::InvalidDomain("localhost".to_string())),
            ("ada@example.", EmailError::InvalidDomain("example.".to_string())),
            ("ada@", EmailError::InvalidDomain(String::new())),
        ];
        for (raw, expected) in cases {
            assert_eq!(Email::parse(raw).unwrap_err(), expected, "{raw:?}");
        }
    }

    #[test]
    fn test_rejects_overlong_address() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            Email::parse(&long).unwrap_err(),
            EmailError::TooLong { max: 254 }
        );
    }

    #[test]
    fn test_normalized_matches_login_spelling() {
        let registered = Email::normalized("Ada@Example.com").unwrap();
        let login = Email::normalized("  ADA@example.COM\n").unwrap();
        assert_eq!(registered, login);
    }

    #[test]
    fn test_parse_keeps_contact_casing() {
        let email = Email::parse("Agent@Homestead.test").unwrap();
        assert_eq!(email.to_string(), "Agent@Homestead.test");
    }

    #[test]
    fn test_normalized_blank_is_empty() {
        assert_eq!(Email::normalized("   ").unwrap_err(), EmailError::Empty);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let email = Email::parse("ada@example.com").unwrap();
        assert_eq!(serde_json::to_value(&email).unwrap(), "ada@example.com");
    }
}
