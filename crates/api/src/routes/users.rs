//! User profile handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use homestead_core::UserId;

use super::ApiJson;
use crate::error::{AppError, Result};
use crate::models::{User, UserChanges, UserPatch};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Account lookup request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRequest {
    pub user_id: UserId,
}

/// Account lookup response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub user: User,
}

/// Fetch a user by id.
#[instrument(skip(state))]
pub async fn account(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AccountRequest>,
) -> Result<Json<AccountResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let user = auth.get_profile(body.user_id).await.map_err(|e| match e {
        AuthError::UserNotFound => AppError::BadRequest("Can't find user".to_string()),
        other => other.into(),
    })?;

    Ok(Json(AccountResponse { user }))
}

/// Apply a partial update to a user.
#[instrument(skip(state, patch))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Result<Json<User>> {
    let changes = UserChanges::try_from(patch)?;
    let auth = AuthService::new(state.pool(), state.tokens());
    Ok(Json(auth.update_profile(id, &changes).await?))
}
