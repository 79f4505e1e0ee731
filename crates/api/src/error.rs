//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. Responses are JSON objects with a non-specific
//! message, usually under `error`; failed logins use `emailError` or
//! `passError` so clients can point at the offending field.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationError;
use crate::search::SearchError;
use crate::services::auth::AuthError;
use crate::services::catalog::CatalogError;
use crate::services::media::MediaError;
use crate::services::views::ViewError;

const SERVER_ERROR: &str = "Server error, please try again later";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Request body or parameters failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Image upload failed.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Search failed.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Registering a view failed.
    #[error("View error: {0}")]
    View(#[from] ViewError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Storing a property create or update failed.
    #[error("Property write failed: {0}")]
    PropertyWrite(#[source] RepositoryError),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(e) => Self::Validation(e),
            CatalogError::NotFound => Self::NotFound("Property not found".to_string()),
            CatalogError::Repository(e) => Self::Database(e),
            CatalogError::Search(e) => Self::Search(e),
        }
    }
}

impl AppError {
    /// Map a failed property create or update.
    ///
    /// Storage failures on these writes answer 400 rather than the opaque 500
    /// used for reads; everything else maps as usual.
    #[must_use]
    pub fn from_property_write(err: CatalogError) -> Self {
        match err {
            CatalogError::Repository(e) => Self::PropertyWrite(e),
            other => other.into(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(ValidationError::Body(rejection.body_text()))
    }
}

impl AppError {
    /// Whether this error is a server-side fault worth reporting.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_)
            | Self::Media(_)
            | Self::Search(_)
            | Self::View(_)
            | Self::PropertyWrite(_) => true,
            Self::Auth(err) => err.is_server_error(),
            Self::Validation(_) | Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    /// Status code and JSON body sent to the client.
    fn response_parts(&self) -> (StatusCode, serde_json::Value) {
        let error = |status: StatusCode, message: &str| (status, json!({ "error": message }));

        match self {
            Self::Database(_) => error(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR),
            Self::PropertyWrite(_) => error(StatusCode::BAD_REQUEST, "Property could not be saved"),
            Self::Auth(err) => match err {
                AuthError::Validation(e) => error(StatusCode::BAD_REQUEST, &e.to_string()),
                AuthError::DuplicateEmail => {
                    error(StatusCode::BAD_REQUEST, "This email is already registered")
                }
                AuthError::UnknownEmail => (
                    StatusCode::BAD_REQUEST,
                    json!({ "emailError": "Incorrect email" }),
                ),
                AuthError::BadPassword => (
                    StatusCode::BAD_REQUEST,
                    json!({ "passError": "Incorrect password" }),
                ),
                AuthError::UserNotFound => error(StatusCode::NOT_FOUND, "User not found"),
                AuthError::MissingToken => error(StatusCode::UNAUTHORIZED, "No token provided"),
                AuthError::InvalidToken => {
                    error(StatusCode::INTERNAL_SERVER_ERROR, "Check your connection")
                }
                AuthError::TokenSigning(_)
                | AuthError::TokenLifetime
                | AuthError::Repository(_)
                | AuthError::PasswordHash => {
                    error(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
                }
            },
            Self::Validation(e) => error(StatusCode::BAD_REQUEST, &e.to_string()),
            Self::Media(_) => error(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed"),
            Self::Search(_) => error(StatusCode::INTERNAL_SERVER_ERROR, "Search failed"),
            Self::View(_) => error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to register view"),
            Self::NotFound(msg) => error(StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => error(StatusCode::BAD_REQUEST, msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, body) = self.response_parts();
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parts(err: AppError) -> (StatusCode, serde_json::Value) {
        err.response_parts()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("property-123".to_string());
        assert_eq!(err.to_string(), "Not found: property-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_login_errors_use_field_keys() {
        let (status, body) = parts(AuthError::UnknownEmail.into());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "emailError": "Incorrect email" }));

        let (status, body) = parts(AuthError::BadPassword.into());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "passError": "Incorrect password" }));
    }

    #[test]
    fn test_auth_status_codes() {
        let (status, body) = parts(AuthError::DuplicateEmail.into());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "This email is already registered");

        let (status, body) = parts(AuthError::MissingToken.into());
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "No token provided");

        let (status, _) = parts(AuthError::InvalidToken.into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = parts(AuthError::UserNotFound.into());
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_server_errors_are_opaque() {
        let (status, body) = parts(AppError::Database(RepositoryError::DataCorruption(
            "secret detail".to_string(),
        )));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("secret detail"));

        let (status, body) = parts(AppError::Media(MediaError::Api {
            status: 401,
            message: "bad signature".to_string(),
        }));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Upload failed" }));

        let (_, body) = parts(ViewError::PropertyNotFound.into());
        assert_eq!(body, json!({ "error": "Failed to register view" }));
    }

    #[test]
    fn test_catalog_errors_map_to_statuses() {
        let (status, body) = parts(CatalogError::NotFound.into());
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Property not found");

        let (status, body) = parts(CatalogError::Validation(ValidationError::ReadOnly("views")).into());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "views cannot be updated directly");
    }

    #[test]
    fn test_property_write_failures_are_bad_requests() {
        let err = AppError::from_property_write(CatalogError::Repository(
            RepositoryError::DataCorruption("secret detail".to_string()),
        ));
        let (status, body) = parts(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Property could not be saved" }));

        let (status, _) = parts(AppError::from_property_write(CatalogError::NotFound));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = parts(CatalogError::Repository(RepositoryError::NotFound).into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_server_error_classification() {
        assert!(AppError::PropertyWrite(RepositoryError::NotFound).is_server_error());
        assert!(AppError::Auth(AuthError::PasswordHash).is_server_error());
        assert!(!AppError::Auth(AuthError::BadPassword).is_server_error());
        assert!(!AppError::BadRequest("x".to_string()).is_server_error());
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
