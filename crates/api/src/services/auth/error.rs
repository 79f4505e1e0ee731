//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The request body failed validation (blank field, malformed email).
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Registration with an email that already belongs to a user.
    #[error("email already registered")]
    DuplicateEmail,

    /// Login with an email that belongs to no user.
    #[error("unknown email")]
    UnknownEmail,

    /// Login with the wrong password.
    #[error("incorrect password")]
    BadPassword,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// No bearer token was supplied.
    #[error("no token provided")]
    MissingToken,

    /// The bearer token is malformed, expired, or signed with another key.
    #[error("invalid token")]
    InvalidToken,

    /// Token signing failed.
    #[error("token signing error: {0}")]
    TokenSigning(#[source] jsonwebtoken::errors::Error),

    /// The token expiry falls outside the representable date range.
    #[error("token lifetime overflows the expiry timestamp")]
    TokenLifetime,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether this error is a server-side fault rather than a client mistake.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::TokenSigning(_)
                | Self::TokenLifetime
                | Self::Repository(_)
                | Self::PasswordHash
        )
    }
}
