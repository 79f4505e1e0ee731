//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::search::{SearchError, SearchIndex};
use crate::services::auth::TokenService;
use crate::services::media::{MediaClient, MediaError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("media client: {0}")]
    Media(#[from] MediaError),
    #[error("search index: {0}")]
    Search(#[from] SearchError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The pool, token keys, media credentials and
/// search index are built once at startup from the configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    tokens: TokenService,
    media: MediaClient,
    search: SearchIndex,
}

impl AppState {
    /// Create a new application state with an empty search index.
    ///
    /// # Errors
    ///
    /// Returns an error if the media client or search index cannot be created.
    pub fn new(config: &ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let tokens = TokenService::new(&config.auth);
        let media = MediaClient::new(&config.media)?;
        let search = SearchIndex::new()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                pool,
                tokens,
                media,
                search,
            }),
        })
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the bearer token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the Cloudinary upload client.
    #[must_use]
    pub fn media(&self) -> &MediaClient {
        &self.inner.media
    }

    /// Get a reference to the property search index.
    #[must_use]
    pub fn search(&self) -> &SearchIndex {
        &self.inner.search
    }
}
