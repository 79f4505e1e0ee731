//! Property listing domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use homestead_core::{Email, PropertyId};

use super::ValidationError;

/// A property listing.
///
/// Coordinates and the numeric-looking descriptors (price, rating, rooms,
/// area) are free text as entered by the listing author.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: PropertyId,
    pub contact_email: Option<String>,
    pub contact_number: Option<String>,
    pub contact_name: Option<String>,
    pub features: Vec<String>,
    pub image_urls: Vec<String>,
    pub liked: bool,
    pub title: Option<String>,
    pub location: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub area: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    /// Deduplicated view count; only the view path increments it.
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Property fields accepted from clients, for both create and patch.
///
/// Every field is optional. Unknown fields are rejected.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PropertyInput {
    pub contact_email: Option<String>,
    pub contact_number: Option<String>,
    pub contact_name: Option<String>,
    pub features: Option<Vec<String>>,
    pub image_urls: Option<Vec<String>>,
    pub liked: Option<bool>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub area: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    /// Initial view count; accepted on create only.
    pub views: Option<i64>,
}

impl PropertyInput {
    /// Validate a body used to create a property.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any present field is malformed or the
    /// initial view count is negative.
    pub fn validate_new(&self) -> Result<(), ValidationError> {
        if self.views.is_some_and(|views| views < 0) {
            return Err(ValidationError::Negative("views"));
        }
        self.validate_fields()
    }

    /// Validate a body used to patch an existing property.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any present field is malformed or the
    /// body tries to set the view counter.
    pub fn validate_patch(&self) -> Result<(), ValidationError> {
        if self.views.is_some() {
            return Err(ValidationError::ReadOnly("views"));
        }
        self.validate_fields()
    }

    /// Whether the body sets no field at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.contact_email.is_none()
            && self.contact_number.is_none()
            && self.contact_name.is_none()
            && self.features.is_none()
            && self.image_urls.is_none()
            && self.liked.is_none()
            && self.title.is_none()
            && self.location.is_none()
            && self.lat.is_none()
            && self.lng.is_none()
            && self.price.is_none()
            && self.rating.is_none()
            && self.bedrooms.is_none()
            && self.bathrooms.is_none()
            && self.area.is_none()
            && self.kind.is_none()
            && self.description.is_none()
            && self.views.is_none()
    }

    fn validate_fields(&self) -> Result<(), ValidationError> {
        if let Some(email) = self.contact_email.as_deref().filter(|e| !e.trim().is_empty()) {
            Email::parse(email.trim()).map_err(|source| ValidationError::InvalidEmail {
                field: "contactEmail",
                source,
            })?;
        }

        if let Some(lat) = &self.lat {
            validate_coordinate(lat, "lat", 90)?;
        }
        if let Some(lng) = &self.lng {
            validate_coordinate(lng, "lng", 180)?;
        }

        for raw in self.image_urls.iter().flatten() {
            let url = Url::parse(raw).map_err(|_| ValidationError::InvalidUrl(raw.clone()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ValidationError::InvalidUrl(raw.clone()));
            }
        }

        Ok(())
    }
}

/// Check that a textual coordinate parses and lies within `[-max, max]`.
fn validate_coordinate(value: &str, field: &'static str, max: u8) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    let invalid = || ValidationError::InvalidCoordinate {
        field,
        max,
        value: value.to_string(),
    };

    let parsed: f64 = trimmed.parse().map_err(|_| invalid())?;
    if !parsed.is_finite() || parsed.abs() > f64::from(max) {
        return Err(invalid());
    }
    Ok(())
}

/// Listing filters, combined with AND. `None` means "not filtered".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PropertyFilters {
    /// Exact match on the liked flag.
    pub liked: Option<bool>,
    /// Exact match on location.
    pub location: Option<String>,
    /// Case-insensitive substring match on title.
    pub title: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_input_accepts_full_listing() {
        let input: PropertyInput = serde_json::from_str(
            r#"{
                "contactEmail": "agent@example.com",
                "contactNumber": "555-0199",
                "contactName": "Agent Smith",
                "features": ["pool", "garage"],
                "imageUrls": ["https://res.cloudinary.com/demo/image/upload/a.jpg"],
                "liked": false,
                "title": "Sunny Loft",
                "location": "Lisbon",
                "lat": "38.7223",
                "lng": "-9.1393",
                "price": "350000",
                "rating": "4.5",
                "bedrooms": "2",
                "bathrooms": "1",
                "area": "85",
                "type": "apartment",
                "description": "Bright loft near the river"
            }"#,
        )
        .unwrap();

        assert_eq!(input.kind.as_deref(), Some("apartment"));
        assert!(input.validate_new().is_ok());
        assert!(input.validate_patch().is_ok());
    }

    #[test]
    fn test_input_rejects_unknown_fields() {
        let result: Result<PropertyInput, _> = serde_json::from_str(r#"{"owner":"mallory"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_input_rejects_wrong_types() {
        let result: Result<PropertyInput, _> = serde_json::from_str(r#"{"liked":"yes"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_views_only_on_create() {
        let input = PropertyInput {
            views: Some(3),
            ..PropertyInput::default()
        };
        assert!(input.validate_new().is_ok());
        assert!(matches!(
            input.validate_patch(),
            Err(ValidationError::ReadOnly("views"))
        ));
    }

    #[test]
    fn test_negative_views_rejected() {
        let input = PropertyInput {
            views: Some(-1),
            ..PropertyInput::default()
        };
        assert!(matches!(
            input.validate_new(),
            Err(ValidationError::Negative("views"))
        ));
    }

    #[test]
    fn test_coordinates_validated() {
        let input = PropertyInput {
            lat: Some("91".to_string()),
            ..PropertyInput::default()
        };
        assert!(matches!(
            input.validate_new(),
            Err(ValidationError::InvalidCoordinate { field: "lat", .. })
        ));

        let input = PropertyInput {
            lng: Some("east".to_string()),
            ..PropertyInput::default()
        };
        assert!(input.validate_new().is_err());

        let input = PropertyInput {
            lat: Some(String::new()),
            lng: Some("-179.9".to_string()),
            ..PropertyInput::default()
        };
        assert!(input.validate_new().is_ok());
    }

    #[test]
    fn test_image_urls_must_be_http() {
        let input = PropertyInput {
            image_urls: Some(vec!["ftp://files.example.com/a.jpg".to_string()]),
            ..PropertyInput::default()
        };
        assert!(matches!(
            input.validate_new(),
            Err(ValidationError::InvalidUrl(_))
        ));

        let input = PropertyInput {
            image_urls: Some(vec!["not a url".to_string()]),
            ..PropertyInput::default()
        };
        assert!(input.validate_new().is_err());
    }

    #[test]
    fn test_contact_email_validated() {
        let input = PropertyInput {
            contact_email: Some("nobody".to_string()),
            ..PropertyInput::default()
        };
        assert!(matches!(
            input.validate_new(),
            Err(ValidationError::InvalidEmail {
                field: "contactEmail",
                ..
            })
        ));
    }

    #[test]
    fn test_is_empty() {
        assert!(PropertyInput::default().is_empty());
        let input = PropertyInput {
            liked: Some(true),
            ..PropertyInput::default()
        };
        assert!(!input.is_empty());
    }

    #[test]
    fn test_property_serializes_type_and_camel_case() {
        let property = Property {
            id: PropertyId::new(1),
            contact_email: None,
            contact_number: None,
            contact_name: None,
            features: vec![],
            image_urls: vec![],
            liked: false,
            title: Some("Sunny Loft".to_string()),
            location: None,
            lat: None,
            lng: None,
            price: None,
            rating: None,
            bedrooms: None,
            bathrooms: None,
            area: None,
            kind: Some("loft".to_string()),
            description: None,
            views: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&property).unwrap();
        assert_eq!(json["type"], "loft");
        assert_eq!(json["imageUrls"], serde_json::json!([]));
        assert_eq!(json["views"], 0);
    }
}
