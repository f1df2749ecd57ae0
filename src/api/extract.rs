use crate::api::AppState;
use crate::errors::AppError;
use crate::services::jwt::Principal;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// Bearer-token gate: every guarded handler receives its Principal through
/// this extractor, so no handler runs without a verified access token.
#[axum::async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AppError::MissingToken)?;
        let value = header.to_str().map_err(|_| AppError::MissingToken)?;
        let token = value.strip_prefix("Bearer ").unwrap_or(value);
        let claims = state.jwt.verify_access(token)?;
        Principal::try_from(claims)
    }
}
