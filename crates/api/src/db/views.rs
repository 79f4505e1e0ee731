//! View ledger operations.
//!
//! A view is counted at most once per (user, property) per window. The ledger
//! upsert and the counter increment run as a single statement, so concurrent
//! views from the same user cannot double count.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use homestead_core::{PropertyId, UserId};

use super::RepositoryError;

/// Outcome of recording a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct RecordedView {
    /// The property's view count after this call.
    pub views: i64,
    /// Whether this call incremented the counter.
    pub counted: bool,
}

/// Repository for the per-user view ledger.
pub struct ViewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ViewRepository<'a> {
    /// Create a new view repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record that `user` viewed `property` at `now`.
    ///
    /// The ledger entry is written and the counter incremented only when the
    /// user has no entry for this property or their entry is older than
    /// `cutoff`. Otherwise both are left untouched and the current count is
    /// returned.
    ///
    /// The uncounted branch re-reads the counter through a no-op `UPDATE` so
    /// it waits for, and reports, a concurrent increment of the same property
    /// instead of the statement's starting snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the property does not exist.
    /// Returns `RepositoryError::Database` if the statement fails, including
    /// when the user does not exist.
    #[instrument(skip(self))]
    pub async fn record_view(
        &self,
        user: UserId,
        property: PropertyId,
        now: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    ) -> Result<RecordedView, RepositoryError> {
        let recorded = sqlx::query_as::<_, RecordedView>(
            r"
            WITH counted AS (
                INSERT INTO homestead.property_view (user_id, property_id, last_viewed_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, property_id) DO UPDATE
                    SET last_viewed_at = EXCLUDED.last_viewed_at
                    WHERE homestead.property_view.last_viewed_at < $4
                RETURNING property_id
            ),
            bumped AS (
                UPDATE homestead.property
                SET views = views + 1
                WHERE id IN (SELECT property_id FROM counted)
                RETURNING views
            )
            reread AS (
                UPDATE homestead.property
                SET views = views
                WHERE id = $2 AND NOT EXISTS (SELECT 1 FROM counted)
                RETURNING views
            )
            SELECT views, TRUE AS counted FROM bumped
            UNION ALL
            SELECT views, FALSE AS counted FROM reread
            ",
        )
        .bind(user.as_i32())
        .bind(property.as_i32())
        .bind(now)
        .bind(cutoff)
        .fetch_optional(self.pool)
        .await?;

        recorded.ok_or(RepositoryError::NotFound)
    }
}
