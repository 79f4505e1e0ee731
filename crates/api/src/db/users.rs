//! User repository for database operations.
//!
//! This is the credential store: user identity plus the salted password hash.
//! Email uniqueness is enforced by the `user_email_key` unique index.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use homestead_core::{Email, PropertyId, UserId};

use super::RepositoryError;
use crate::models::{User, UserChanges};

const USER_COLUMNS: &str = "id, first_name, last_name, email, phone_number, profile_pic_url, \
                            password_hash, liked_properties, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    first_name: String,
    last_name: String,
    email: String,
    phone_number: String,
    profile_pic_url: Option<String>,
    password_hash: String,
    liked_properties: Vec<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Split the row into the public user and its password hash.
    fn into_parts(self) -> Result<(User, String), RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let user = User {
            id: UserId::new(self.id),
            first_name: self.first_name,
            last_name: self.last_name,
            email,
            phone_number: self.phone_number,
            profile_pic_url: self.profile_pic_url,
            liked_properties: self
                .liked_properties
                .into_iter()
                .map(PropertyId::new)
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        };

        Ok((user, self.password_hash))
    }
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        row.into_parts().map(|(user, _)| user)
    }
}

/// Fields needed to insert a user. The password must already be hashed.
#[derive(Debug)]
pub struct UserRecord<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a Email,
    pub phone_number: &'a str,
    pub profile_pic_url: Option<&'a str>,
    pub password_hash: &'a str,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM homestead.user WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user together with their password hash, by normalized email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM homestead.user WHERE lower(email) = lower($1)"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_parts).transpose()
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, record), fields(email = %record.email))]
    pub async fn create(&self, record: &UserRecord<'_>) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO homestead.user
                (first_name, last_name, email, phone_number, profile_pic_url, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(record.first_name)
        .bind(record.last_name)
        .bind(record.email.as_str())
        .bind(record.phone_number)
        .bind(record.profile_pic_url)
        .bind(record.password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "email"))?;

        row.try_into()
    }

    /// Apply a validated patch to a user.
    ///
    /// Returns `None` if no user has this ID. An empty patch returns the
    /// current record unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new email belongs to another user.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, RepositoryError> {
        if changes.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query = QueryBuilder::<Postgres>::new("UPDATE homestead.user SET updated_at = NOW()");
        if let Some(first_name) = &changes.first_name {
            query.push(", first_name = ").push_bind(first_name.clone());
        }
        if let Some(last_name) = &changes.last_name {
            query.push(", last_name = ").push_bind(last_name.clone());
        }
        if let Some(email) = &changes.email {
            query.push(", email = ").push_bind(email.as_str().to_owned());
        }
        if let Some(phone_number) = &changes.phone_number {
            query.push(", phone_number = ").push_bind(phone_number.clone());
        }
        if let Some(profile_pic_url) = &changes.profile_pic_url {
            query
                .push(", profile_pic_url = ")
                .push_bind(profile_pic_url.clone());
        }
        if let Some(liked) = &changes.liked_properties {
            let ids: Vec<i32> = liked.iter().map(PropertyId::as_i32).collect();
            query.push(", liked_properties = ").push_bind(ids);
        }
        query
            .push(" WHERE id = ")
            .push_bind(id.as_i32())
            .push(" RETURNING ")
            .push(USER_COLUMNS);

        let row = query
            .build_query_as::<UserRow>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_unique_violation(e, "email"))?;

        row.map(User::try_from).transpose()
    }
}
