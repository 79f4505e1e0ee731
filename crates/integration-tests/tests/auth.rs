//! Registration, login and token validation against a live server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`homestead migrate run`)
//! - The API server running (`cargo run -p homestead-api`)

#![allow(clippy::unwrap_used)]

use homestead_integration_tests::{
    client, json_body, register_user, registration, unique_email, url,
};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running homestead-api and database"]
async fn test_register_then_login_issues_token_for_same_user() {
    let client = client();
    let email = unique_email();

    let response = client
        .post(url("/register"))
        .json(&registration(&email, "correct horse"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = json_body(response).await;
    assert!(session["user"].get("password").is_none());
    let user_id = session["user"]["id"].clone();

    let response = client
        .post(url("/login"))
        .json(&json!({ "email": email.to_uppercase(), "password": "correct horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let login = json_body(response).await;
    assert_eq!(login["user"]["id"], user_id);

    let token = login["token"].as_str().unwrap();
    let response = client
        .get(url("/validate"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["userId"], user_id);
}

#[tokio::test]
#[ignore = "Requires running homestead-api and database"]
async fn test_duplicate_email_is_rejected() {
    let client = client();
    let body = registration(&unique_email(), "correct horse");

    let first = client.post(url("/register")).json(&body).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = client.post(url("/register")).json(&body).send().await.unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(second).await["error"],
        "This email is already registered"
    );
}

#[tokio::test]
#[ignore = "Requires running homestead-api and database"]
async fn test_login_errors_name_the_wrong_field() {
    let client = client();
    let session = register_user(&client).await;
    let email = session["user"]["email"].as_str().unwrap();

    let response = client
        .post(url("/login"))
        .json(&json!({ "email": email, "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "passError": "Incorrect password" })
    );

    let response = client
        .post(url("/login"))
        .json(&json!({ "email": unique_email(), "password": "correct horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "emailError": "Incorrect email" })
    );
}

#[tokio::test]
#[ignore = "Requires running homestead-api and database"]
async fn test_validate_rejects_bad_headers() {
    let client = client();

    let response = client.get(url("/validate")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(url("/validate"))
        .header("Authorization", "Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
#[ignore = "Requires running homestead-api and database"]
async fn test_account_lookup_and_profile_update() {
    let client = client();
    let session = register_user(&client).await;
    let user_id = session["user"]["id"].clone();

    let response = client
        .post(url("/userAcc"))
        .json(&json!({ "userId": user_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["user"]["id"], user_id);

    let response = client
        .put(url(&format!("/user/{user_id}")))
        .json(&json!({ "firstName": "Grace" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["firstName"], "Grace");
    assert_eq!(updated["lastName"], "Lovelace");
}
