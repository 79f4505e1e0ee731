//! Property catalog handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use homestead_core::PropertyId;

use super::ApiJson;
use crate::error::{AppError, Result};
use crate::models::{Property, PropertyFilters, PropertyInput};
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Listing query parameters. Empty values are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub liked: Option<String>,
    pub location: Option<String>,
    pub title: Option<String>,
}

impl From<ListQuery> for PropertyFilters {
    fn from(query: ListQuery) -> Self {
        let present = |value: Option<String>| value.filter(|v| !v.is_empty());

        Self {
            liked: present(query.liked).map(|liked| liked == "true"),
            location: present(query.location),
            title: present(query.title),
        }
    }
}

/// Create a property.
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PropertyInput>,
) -> Result<(StatusCode, Json<Property>)> {
    let catalog = CatalogService::new(state.pool(), state.search());
    let property = catalog
        .create(&input)
        .await
        .map_err(AppError::from_property_write)?;
    Ok((StatusCode::CREATED, Json(property)))
}

/// List properties matching the query filters.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Property>>> {
    let catalog = CatalogService::new(state.pool(), state.search());
    Ok(Json(catalog.list(&query.into()).await?))
}

/// Fetch one property.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<PropertyId>,
) -> Result<Json<Property>> {
    let catalog = CatalogService::new(state.pool(), state.search());
    Ok(Json(catalog.get(id).await?))
}

/// Apply a partial update to a property.
#[instrument(skip(state, patch))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<PropertyId>,
    ApiJson(patch): ApiJson<PropertyInput>,
) -> Result<Json<Property>> {
    let catalog = CatalogService::new(state.pool(), state.search());
    let property = catalog
        .update(id, &patch)
        .await
        .map_err(AppError::from_property_write)?;
    Ok(Json(property))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_to_filters() {
        let filters: PropertyFilters = ListQuery {
            liked: Some("true".to_string()),
            location: Some("Lisbon".to_string()),
            title: Some("loft".to_string()),
        }
        .into();

        assert_eq!(filters.liked, Some(true));
        assert_eq!(filters.location.as_deref(), Some("Lisbon"));
        assert_eq!(filters.title.as_deref(), Some("loft"));
    }

    #[test]
    fn test_non_true_liked_means_false() {
        let filters: PropertyFilters = ListQuery {
            liked: Some("no".to_string()),
            ..ListQuery::default()
        }
        .into();
        assert_eq!(filters.liked, Some(false));
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let filters: PropertyFilters = ListQuery {
            liked: Some(String::new()),
            location: Some(String::new()),
            title: Some(String::new()),
        }
        .into();
        assert_eq!(filters, PropertyFilters::default());
    }
}
