//! Property repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use homestead_core::PropertyId;

use super::RepositoryError;
use crate::models::{Property, PropertyFilters, PropertyInput};

const PROPERTY_COLUMNS: &str = "id, contact_email, contact_number, contact_name, features, \
                                image_urls, liked, title, location, lat, lng, price, rating, \
                                bedrooms, bathrooms, area, property_type, description, views, \
                                created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` property queries.
#[derive(Debug, sqlx::FromRow)]
struct PropertyRow {
    id: i32,
    contact_email: Option<String>,
    contact_number: Option<String>,
    contact_name: Option<String>,
    features: Vec<String>,
    image_urls: Vec<String>,
    liked: bool,
    title: Option<String>,
    location: Option<String>,
    lat: Option<String>,
    lng: Option<String>,
    price: Option<String>,
    rating: Option<String>,
    bedrooms: Option<String>,
    bathrooms: Option<String>,
    area: Option<String>,
    property_type: Option<String>,
    description: Option<String>,
    views: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Self {
            id: PropertyId::new(row.id),
            contact_email: row.contact_email,
            contact_number: row.contact_number,
            contact_name: row.contact_name,
            features: row.features,
            image_urls: row.image_urls,
            liked: row.liked,
            title: row.title,
            location: row.location,
            lat: row.lat,
            lng: row.lng,
            price: row.price,
            rating: row.rating,
            bedrooms: row.bedrooms,
            bathrooms: row.bathrooms,
            area: row.area,
            kind: row.property_type,
            description: row.description,
            views: row.views,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for property database operations.
pub struct PropertyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PropertyRepository<'a> {
    /// Create a new property repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new property. Absent collections default to empty, `liked`
    /// to false and `views` to zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: &PropertyInput) -> Result<Property, RepositoryError> {
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            r"
            INSERT INTO homestead.property
                (contact_email, contact_number, contact_name, features, image_urls, liked,
                 title, location, lat, lng, price, rating, bedrooms, bathrooms, area,
                 property_type, description, views)
            VALUES ($1, $2, $3, COALESCE($4, '{{}}'::TEXT[]), COALESCE($5, '{{}}'::TEXT[]),
                    COALESCE($6, FALSE), $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    COALESCE($18, 0))
            RETURNING {PROPERTY_COLUMNS}
            "
        ))
        .bind(input.contact_email.as_deref())
        .bind(input.contact_number.as_deref())
        .bind(input.contact_name.as_deref())
        .bind(input.features.as_deref())
        .bind(input.image_urls.as_deref())
        .bind(input.liked)
        .bind(input.title.as_deref())
        .bind(input.location.as_deref())
        .bind(input.lat.as_deref())
        .bind(input.lng.as_deref())
        .bind(input.price.as_deref())
        .bind(input.rating.as_deref())
        .bind(input.bedrooms.as_deref())
        .bind(input.bathrooms.as_deref())
        .bind(input.area.as_deref())
        .bind(input.kind.as_deref())
        .bind(input.description.as_deref())
        .bind(input.views)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get a property by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM homestead.property WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Property::from))
    }

    /// Get several properties by ID, in ascending ID order.
    ///
    /// Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn get_many(&self, ids: &[PropertyId]) -> Result<Vec<Property>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = ids.iter().map(PropertyId::as_i32).collect();
        let rows = sqlx::query_as::<_, PropertyRow>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM homestead.property WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Property::from).collect())
    }

    /// List every property matching all the given filters, in ID order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, filters: &PropertyFilters) -> Result<Vec<Property>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PROPERTY_COLUMNS} FROM homestead.property WHERE TRUE"
        ));

        if let Some(liked) = filters.liked {
            query.push(" AND liked = ").push_bind(liked);
        }
        if let Some(location) = &filters.location {
            query.push(" AND location = ").push_bind(location.clone());
        }
        if let Some(title) = &filters.title {
            query
                .push(" AND title ILIKE ")
                .push_bind(contains_pattern(title));
        }
        query.push(" ORDER BY id");

        let rows = query
            .build_query_as::<PropertyRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Property::from).collect())
    }

    /// Apply a validated patch to a property.
    ///
    /// Returns `None` if no property has this ID. The view counter is never
    /// touched here; an empty patch returns the current record unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: PropertyId,
        patch: &PropertyInput,
    ) -> Result<Option<Property>, RepositoryError> {
        if patch.is_empty() {
            return self.get(id).await;
        }

        let mut query =
            QueryBuilder::<Postgres>::new("UPDATE homestead.property SET updated_at = NOW()");
        push_set(&mut query, "contact_email", patch.contact_email.clone());
        push_set(&mut query, "contact_number", patch.contact_number.clone());
        push_set(&mut query, "contact_name", patch.contact_name.clone());
        push_set(&mut query, "features", patch.features.clone());
        push_set(&mut query, "image_urls", patch.image_urls.clone());
        push_set(&mut query, "liked", patch.liked);
        push_set(&mut query, "title", patch.title.clone());
        push_set(&mut query, "location", patch.location.clone());
        push_set(&mut query, "lat", patch.lat.clone());
        push_set(&mut query, "lng", patch.lng.clone());
        push_set(&mut query, "price", patch.price.clone());
        push_set(&mut query, "rating", patch.rating.clone());
        push_set(&mut query, "bedrooms", patch.bedrooms.clone());
        push_set(&mut query, "bathrooms", patch.bathrooms.clone());
        push_set(&mut query, "area", patch.area.clone());
        push_set(&mut query, "property_type", patch.kind.clone());
        push_set(&mut query, "description", patch.description.clone());
        query
            .push(" WHERE id = ")
            .push_bind(id.as_i32())
            .push(" RETURNING ")
            .push(PROPERTY_COLUMNS);

        let row = query
            .build_query_as::<PropertyRow>()
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Property::from))
    }
}

/// Append `, column = $n` when the patch carries a value for `column`.
fn push_set<'args, T>(query: &mut QueryBuilder<'args, Postgres>, column: &str, value: Option<T>)
where
    T: 'args + sqlx::Encode<'args, Postgres> + sqlx::Type<Postgres> + Send,
{
    if let Some(value) = value {
        query.push(", ").push(column).push(" = ").push_bind(value);
    }
}

/// Build an `ILIKE` pattern matching `needle` anywhere, with wildcards escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_wraps_needle() {
        assert_eq!(contains_pattern("loft"), "%loft%");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_push_set_skips_absent_fields() {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE t SET updated_at = NOW()");
        push_set(&mut query, "title", Some("Loft".to_string()));
        push_set::<String>(&mut query, "location", None);
        push_set(&mut query, "liked", Some(true));

        assert_eq!(
            query.sql(),
            "UPDATE t SET updated_at = NOW(), title = $1, liked = $2"
        );
    }
}
