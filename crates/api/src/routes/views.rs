//! View registration handler.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use homestead_core::{PropertyId, UserId};

use super::ApiJson;
use crate::error::Result;
use crate::services::views::ViewService;
use crate::state::AppState;

/// View registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest {
    pub user_id: UserId,
    pub property_id: PropertyId,
}

/// The property's view count after registration.
#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub views: i64,
}

/// Register that a user viewed a property.
#[instrument(skip(state))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ViewRequest>,
) -> Result<Json<ViewResponse>> {
    let views = ViewService::new(state.pool())
        .register_view(body.user_id, body.property_id)
        .await?;
    Ok(Json(ViewResponse { views }))
}
