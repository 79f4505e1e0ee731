//! HTTP route handlers for the listing API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database ping)
//!
//! # Auth
//! POST /register               - Create a user, returns {token, user}
//! POST /login                  - Sign in, returns {token, user}
//! GET  /validate               - Verify the bearer token
//!
//! # Users
//! POST /userAcc                - Fetch a user by id ({userId})
//! PUT  /user/{id}              - Partial user update
//!
//! # Properties
//! POST /properties             - Create a property
//! GET  /properties             - List properties (?liked&location&title)
//! GET  /properties/{id}        - Fetch one property
//! PUT  /properties/{id}        - Partial property update
//! POST /views                  - Register a view ({userId, propertyId})
//! GET  /search                 - Fuzzy search (?q=)
//!
//! # Media
//! POST /upload                 - Multipart `image` upload, returns {url}
//! ```

pub mod auth;
pub mod properties;
pub mod search;
pub mod upload;
pub mod users;
pub mod views;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRequest},
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejections are `AppError` validation errors.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Create the auth and user routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/validate", get(auth::validate))
        .route("/userAcc", post(users::account))
        .route("/user/{id}", put(users::update))
}

/// Create the property routes router.
pub fn property_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/properties",
            get(properties::index).post(properties::create),
        )
        .route(
            "/properties/{id}",
            get(properties::show).put(properties::update),
        )
        .route("/views", post(views::register))
        .route("/search", get(search::search))
}

/// Create the upload routes router.
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload::upload))
        .layer(DefaultBodyLimit::max(upload::MAX_UPLOAD_BYTES))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(property_routes())
        .merge(upload_routes())
}
