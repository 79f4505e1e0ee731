//! Search index builder.
//!
//! Loads every property from the database into the index at startup.

use sqlx::PgPool;
use tracing::{error, info, instrument};

use crate::db::RepositoryError;
use crate::db::properties::PropertyRepository;
use crate::models::PropertyFilters;

use super::{SearchError, SearchIndex};

/// Spawn a background task that loads all properties into the index.
///
/// Until it finishes, searches only see properties created or updated since
/// startup.
pub fn build_index_async(search_index: SearchIndex, pool: PgPool) {
    info!("Spawning background search index build task");
    tokio::spawn(async move {
        match build_index(&search_index, &pool).await {
            Ok(count) => {
                info!(count, docs = search_index.num_docs(), "Search index is ready");
            }
            Err(e) => {
                error!(error = %e, "Failed to build search index");
            }
        }
    });
}

/// Load every property into the index.
///
/// The writer lock is held from before the read until the commit, so a
/// concurrent upsert cannot be overwritten by an older row.
#[instrument(skip_all)]
async fn build_index(search_index: &SearchIndex, pool: &PgPool) -> Result<usize, BuildError> {
    let mut writer = search_index.lock_writer().await;

    let properties = PropertyRepository::new(pool)
        .list(&PropertyFilters::default())
        .await?;

    for property in &properties {
        search_index.stage(&writer, property)?;
    }
    search_index.commit(&mut writer)?;

    Ok(properties.len())
}

/// Build error wrapper.
#[derive(Debug, thiserror::Error)]
enum BuildError {
    #[error("failed to load properties: {0}")]
    Load(#[from] RepositoryError),
    #[error(transparent)]
    Search(#[from] SearchError),
}
