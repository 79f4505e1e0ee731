//! Authentication service.
//!
//! Password registration and login, bearer tokens, and profile access.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenService, parse_bearer};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use homestead_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::{UserRecord, UserRepository};
use crate::models::{NewUser, User, UserChanges};

/// A freshly authenticated user and their bearer token.
#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// Authentication service.
///
/// Handles user registration, login, and profile reads and updates.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Register a new user and sign them in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if a required field is blank or the email is malformed.
    /// Returns `AuthError::DuplicateEmail` if the email is already registered.
    #[instrument(skip(self, new_user))]
    pub async fn register(&self, new_user: &NewUser) -> Result<AuthSession, AuthError> {
        let email = new_user.validate()?;
        let password_hash = hash_password(&new_user.password)?;

        let record = UserRecord {
            first_name: new_user.first_name.trim(),
            last_name: new_user.last_name.trim(),
            email: &email,
            phone_number: new_user.phone_number.trim(),
            profile_pic_url: new_user.profile_pic_url.as_deref(),
            password_hash: &password_hash,
        };

        let user = self.users.create(&record).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::DuplicateEmail,
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, "Registered user");
        self.session(user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownEmail` if no user has this email, including
    /// when the email is malformed.
    /// Returns `AuthError::BadPassword` if the password does not match.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = Email::normalized(email).map_err(|e| {
            tracing::debug!(error = %e, "Login with malformed email");
            AuthError::UnknownEmail
        })?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::UnknownEmail)?;

        verify_password(password, &password_hash)?;

        self.session(user)
    }

    /// Get a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Apply a validated patch to a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    /// Returns `AuthError::DuplicateEmail` if the new email belongs to another user.
    #[instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        changes: &UserChanges,
    ) -> Result<User, AuthError> {
        self.users
            .update(user_id, changes)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::DuplicateEmail,
                other => AuthError::Repository(other),
            })?
            .ok_or(AuthError::UserNotFound)
    }

    fn session(&self, user: User) -> Result<AuthSession, AuthError> {
        let token = self.tokens.issue(user.id)?;
        Ok(AuthSession { token, user })
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::BadPassword)
}
