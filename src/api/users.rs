use crate::api::types::AgentsQuery;
use crate::api::AppState;
use crate::errors::{AppError, Result};
use crate::models::user::{Role, UserResponse};
use crate::services::jwt::Principal;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/agents", get(agents))
        .route("/clients", get(clients))
        .route("/:id", get(get_user))
}

#[utoipa::path(get, path = "/api/users/me", responses((status = 200, body = UserResponse)))]
pub async fn me(State(state): State<AppState>, principal: Principal) -> Result<Json<UserResponse>> {
    let user = state
        .db
        .get_user_by_id(&principal.id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    let org = state.db.get_organization(&user.org_id).await?;
    Ok(Json(UserResponse::from_user(user, org)))
}

#[utoipa::path(get, path = "/api/users/agents", responses((status = 200, body = [UserResponse])))]
pub async fn agents(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<AgentsQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    principal.require_role(&[Role::Admin])?;
    let users = state
        .db
        .list_users_by_role(Role::Field, query.org_id.as_ref())
        .await?;
    Ok(Json(
        users
            .into_iter()
            .map(|u| UserResponse::from_user(u, None))
            .collect(),
    ))
}

#[utoipa::path(get, path = "/api/users/clients", responses((status = 200, body = [UserResponse])))]
pub async fn clients(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<UserResponse>>> {
    principal.require_role(&[Role::Admin])?;
    let users = state.db.list_users_by_role(Role::Client, None).await?;
    Ok(Json(
        users
            .into_iter()
            .map(|u| UserResponse::from_user(u, None))
            .collect(),
    ))
}

#[utoipa::path(get, path = "/api/users/{id}", responses((status = 200, body = UserResponse), (status = 404, description = "Unknown user")))]
pub async fn get_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>> {
    principal.require_role(&[Role::Admin])?;
    let user = state
        .db
        .get_user_by_id(&id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    let org = state.db.get_organization(&user.org_id).await?;
    Ok(Json(UserResponse::from_user(user, org)))
}
