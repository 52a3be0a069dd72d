use axum::{extract::FromRequestParts, http::request::Parts};

use shared_types::{AppError, UserSummary};

use super::jwt::decode_token;

/// Extractor for the authenticated user. Reads the bearer token from
/// the `Authorization` header; returns 401 when missing or invalid.
pub struct CurrentUser(pub UserSummary);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("authentication required"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("expected a bearer token"))?;

        let user = decode_token(token)?.to_user()?;
        Ok(CurrentUser(user))
    }
}
