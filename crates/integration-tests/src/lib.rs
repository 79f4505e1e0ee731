//! Integration tests for Homestead.
//!
//! These run against a live `homestead-api` backed by a migrated database and
//! are ignored by default.
//!
//! # Running Tests
//!
//! ```bash
//! homestead migrate run
//! cargo run -p homestead-api &
//! cargo test -p homestead-integration-tests -- --ignored
//! ```
//!
//! Set `HOMESTEAD_BASE_URL` to point at a server other than `http://localhost:3000`.
//! Tests that talk to the database directly read `HOMESTEAD_DATABASE_URL`
//! (falling back to `DATABASE_URL`).

use homestead_api::db::users::{UserRecord, UserRepository};
use homestead_api::models::User;
use homestead_core::Email;
use reqwest::{Client, Response};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("HOMESTEAD_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Build a URL for `path` on the API under test.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// Create a plain HTTP client.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// An email address no other test run has used.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@homestead.test", Uuid::new_v4().simple())
}

/// Registration body for `email` with the given password.
#[must_use]
pub fn registration(email: &str, password: &str) -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "phoneNumber": "555-0100",
        "email": email,
        "password": password,
    })
}

/// Read a response body as JSON.
///
/// # Panics
///
/// Panics if the body is not valid JSON.
#[allow(clippy::expect_used)]
pub async fn json_body(response: Response) -> Value {
    response.json().await.expect("Response body was not JSON")
}

/// Register a fresh user and return the `{token, user}` session body.
///
/// # Panics
///
/// Panics if the request fails or registration is rejected.
#[allow(clippy::expect_used)]
pub async fn register_user(client: &Client) -> Value {
    let response = client
        .post(url("/register"))
        .json(&registration(&unique_email(), "correct horse"))
        .send()
        .await
        .expect("Failed to register user");

    assert!(response.status().is_success(), "registration rejected");
    json_body(response).await
}

/// Create a property from `body` and return it.
///
/// # Panics
///
/// Panics if the request fails or the property is rejected.
#[allow(clippy::expect_used)]
pub async fn create_property(client: &Client, body: &Value) -> Value {
    let response = client
        .post(url("/properties"))
        .json(body)
        .send()
        .await
        .expect("Failed to create property");

    assert_eq!(response.status().as_u16(), 201, "property rejected");
    json_body(response).await
}

/// Connect to the migrated test database.
///
/// # Panics
///
/// Panics if no database URL is set or the connection fails.
#[allow(clippy::expect_used)]
pub async fn database() -> PgPool {
    let url = std::env::var("HOMESTEAD_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("HOMESTEAD_DATABASE_URL or DATABASE_URL must be set");
    PgPool::connect(&url)
        .await
        .expect("Failed to connect to database")
}

/// Insert a user straight into the database.
///
/// # Panics
///
/// Panics if the insert fails.
#[allow(clippy::expect_used)]
pub async fn insert_user(pool: &PgPool) -> User {
    let email = Email::normalized(&unique_email()).expect("generated email is valid");
    UserRepository::new(pool)
        .create(&UserRecord {
            first_name: "Ada",
            last_name: "Lovelace",
            email: &email,
            phone_number: "555-0100",
            profile_pic_url: None,
            password_hash: "not-a-real-hash",
        })
        .await
        .expect("Failed to insert user")
}
