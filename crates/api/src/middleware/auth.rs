//! Bearer token extractor.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use homestead_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Extractor that requires a valid `Authorization: Bearer <token>` header.
///
/// Rejects with `AuthError::MissingToken` when the header is absent and
/// `AuthError::InvalidToken` when it does not hold a valid token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(BearerUser(user_id): BearerUser) -> String {
///     format!("Hello, user {user_id}!")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BearerUser(pub UserId);

impl FromRequestParts<AppState> for BearerUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str().unwrap_or_default());

        let user_id = state.tokens().verify_header(header)?;
        set_sentry_user(&user_id);

        Ok(Self(user_id))
    }
}
