//! Registration, login and token validation handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use homestead_core::UserId;

use super::ApiJson;
use crate::error::Result;
use crate::middleware::BearerUser;
use crate::models::NewUser;
use crate::services::auth::{AuthService, AuthSession};
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token validation response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub valid: bool,
    pub user_id: UserId,
}

/// Register a new user.
#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<Json<AuthSession>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    Ok(Json(auth.register(&body).await?))
}

/// Sign in with email and password.
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<AuthSession>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    Ok(Json(auth.login(&body.email, &body.password).await?))
}

/// Confirm the bearer token is valid and report whose it is.
pub async fn validate(BearerUser(user_id): BearerUser) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        valid: true,
        user_id,
    })
}
