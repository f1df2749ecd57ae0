use crate::api::types::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse};
use crate::api::AppState;
use crate::errors::Result;
use crate::models::user::UserSummary;
use crate::services::auth::AuthService;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(login).layer(axum::middleware::from_fn(
                crate::utils::middleware::login_rate_limiter,
            )),
        )
        .route("/refresh", post(refresh))
}

#[utoipa::path(post, path = "/api/auth/login", request_body = LoginRequest, responses((status = 200, body = LoginResponse), (status = 401, description = "Invalid credentials")))]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.db.clone(), state.jwt.clone());
    let (tokens, user) = auth.login(&req.identifier, &req.password).await.map_err(|e| {
        info!(action = "login_failed", identifier = %req.identifier);
        e
    })?;
    info!(action = "login_success", user_id = %user.id, role = user.role.as_str());
    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user: UserSummary::from(&user),
    }))
}

#[utoipa::path(post, path = "/api/auth/refresh", request_body = RefreshRequest, responses((status = 200, body = RefreshResponse), (status = 401, description = "Invalid refresh token")))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>> {
    let auth = AuthService::new(state.db.clone(), state.jwt.clone());
    let tokens = auth.refresh(&req.refresh_token).await?;
    Ok(Json(RefreshResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}
