//! View deduplication service.
//!
//! Counts a user's view of a property at most once per [`ViewWindow`].

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use homestead_core::{PropertyId, UserId, ViewWindow};

use crate::db::RepositoryError;
use crate::db::views::ViewRepository;

/// Errors from registering a view.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The property does not exist.
    #[error("property not found")]
    PropertyNotFound,

    /// The view could not be recorded (including an unknown user).
    #[error("failed to record view: {0}")]
    Repository(#[source] RepositoryError),
}

impl From<RepositoryError> for ViewError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::PropertyNotFound,
            other => Self::Repository(other),
        }
    }
}

/// View deduplication service.
pub struct ViewService<'a> {
    views: ViewRepository<'a>,
    window: ViewWindow,
}

impl<'a> ViewService<'a> {
    /// Create a view service using the default 120 hour window.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self::with_window(pool, ViewWindow::default())
    }

    /// Create a view service with a custom window.
    #[must_use]
    pub const fn with_window(pool: &'a PgPool, window: ViewWindow) -> Self {
        Self {
            views: ViewRepository::new(pool),
            window,
        }
    }

    /// Register a view now and return the property's view count.
    ///
    /// # Errors
    ///
    /// Returns `ViewError` if the property or user does not exist or the write fails.
    pub async fn register_view(
        &self,
        user: UserId,
        property: PropertyId,
    ) -> Result<i64, ViewError> {
        self.register_view_at(user, property, Utc::now()).await
    }

    /// Register a view as if it happened at `now`.
    ///
    /// # Errors
    ///
    /// Returns `ViewError` if the property or user does not exist or the write fails.
    #[instrument(skip(self))]
    pub async fn register_view_at(
        &self,
        user: UserId,
        property: PropertyId,
        now: DateTime<Utc>,
    ) -> Result<i64, ViewError> {
        let recorded = self
            .views
            .record_view(user, property, now, self.window.cutoff(now))
            .await?;

        tracing::debug!(
            views = recorded.views,
            counted = recorded.counted,
            "Registered view"
        );
        Ok(recorded.views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_property_maps_to_not_found() {
        let err = ViewError::from(RepositoryError::NotFound);
        assert!(matches!(err, ViewError::PropertyNotFound));
    }

    #[test]
    fn test_other_errors_are_repository_errors() {
        let err = ViewError::from(RepositoryError::DataCorruption("bad".to_string()));
        assert!(matches!(err, ViewError::Repository(_)));
    }
}
