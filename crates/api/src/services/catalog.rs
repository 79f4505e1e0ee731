//! Property catalog service.
//!
//! Validates listing input, persists it, and keeps the search index in step
//! with every write.

use std::collections::HashMap;

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use homestead_core::PropertyId;

use crate::db::RepositoryError;
use crate::db::properties::PropertyRepository;
use crate::models::{Property, PropertyFilters, PropertyInput, ValidationError};
use crate::search::{MAX_RESULTS, SearchError, SearchIndex};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("property not found")]
    NotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("search error: {0}")]
    Search(#[from] SearchError),
}

/// Property catalog service.
pub struct CatalogService<'a> {
    properties: PropertyRepository<'a>,
    search: &'a SearchIndex,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, search: &'a SearchIndex) -> Self {
        Self {
            properties: PropertyRepository::new(pool),
            search,
        }
    }

    /// Create a property.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the input is malformed.
    /// Returns `CatalogError::Repository` if the insert fails.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: &PropertyInput) -> Result<Property, CatalogError> {
        input.validate_new()?;

        let property = self.properties.create(input).await?;
        tracing::info!(property_id = %property.id, "Created property");

        self.reindex(&property).await;
        Ok(property)
    }

    /// List properties matching all filters.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, filters: &PropertyFilters) -> Result<Vec<Property>, CatalogError> {
        Ok(self.properties.list(filters).await?)
    }

    /// Get a property by ID.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no property has this ID.
    #[instrument(skip(self))]
    pub async fn get(&self, id: PropertyId) -> Result<Property, CatalogError> {
        self.properties.get(id).await?.ok_or(CatalogError::NotFound)
    }

    /// Apply a partial update to a property.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the patch is malformed or touches the view counter.
    /// Returns `CatalogError::NotFound` if no property has this ID.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: PropertyId,
        patch: &PropertyInput,
    ) -> Result<Property, CatalogError> {
        patch.validate_patch()?;

        let property = self
            .properties
            .update(id, patch)
            .await?
            .ok_or(CatalogError::NotFound)?;

        if !patch.is_empty() {
            self.reindex(&property).await;
        }
        Ok(property)
    }

    /// Fuzzy search over title, description and location, best match first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Search` if the index query fails.
    /// Returns `CatalogError::Repository` if the hits cannot be loaded.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Property>, CatalogError> {
        let ids = self.search.search(query, MAX_RESULTS)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = self.properties.get_many(&ids).await?;
        Ok(in_rank_order(&ids, found))
    }

    async fn reindex(&self, property: &Property) {
        if let Err(e) = self.search.upsert(property).await {
            tracing::error!(error = %e, property_id = %property.id, "Failed to index property");
        }
    }
}

/// Reorder `found` to follow `ranked`, dropping ids that no longer exist.
fn in_rank_order(ranked: &[PropertyId], found: Vec<Property>) -> Vec<Property> {
    let mut by_id: HashMap<PropertyId, Property> =
        found.into_iter().map(|p| (p.id, p)).collect();
    ranked.iter().filter_map(|id| by_id.remove(id)).collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn property(id: i32) -> Property {
        Property {
            id: PropertyId::new(id),
            contact_email: None,
            contact_number: None,
            contact_name: None,
            features: vec![],
            image_urls: vec![],
            liked: false,
            title: None,
            location: None,
            lat: None,
            lng: None,
            price: None,
            rating: None,
            bedrooms: None,
            bathrooms: None,
            area: None,
            kind: None,
            description: None,
            views: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_in_rank_order_follows_ranking() {
        let ranked = [PropertyId::new(3), PropertyId::new(1), PropertyId::new(2)];
        let found = vec![property(1), property(2), property(3)];

        let ordered: Vec<i32> = in_rank_order(&ranked, found)
            .iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(ordered, vec![3, 1, 2]);
    }

    #[test]
    fn test_in_rank_order_skips_missing() {
        let ranked = [PropertyId::new(5), PropertyId::new(1)];
        let ordered = in_rank_order(&ranked, vec![property(1)]);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].id, PropertyId::new(1));
    }
}
