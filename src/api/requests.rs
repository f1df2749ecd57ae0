use crate::api::types::{page_params, ListQuery, Pagination, RequestPage};
use crate::api::AppState;
use crate::errors::{AppError, Result};
use crate::models::request::{CreateRequestPayload, RequestStatus, UpdateRequestPayload, VerificationRequest};
use crate::services::jwt::Principal;
use crate::services::requests::RequestService;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_request).patch(update))
}

#[utoipa::path(get, path = "/api/requests", responses((status = 200, body = RequestPage)))]
pub async fn list(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> Result<Json<RequestPage>> {
    let (skip, take) = page_params(query.skip.as_deref(), query.take.as_deref());
    let status = query
        .status
        .as_deref()
        .map(|s| RequestStatus::parse(s).ok_or_else(|| AppError::Validation("Invalid status".to_string())))
        .transpose()?;

    let service = RequestService::new(state.db.clone());
    let (data, total) = service
        .list(&principal, status, query.search, skip, take)
        .await?;
    Ok(Json(RequestPage {
        data,
        pagination: Pagination::new(total, skip, take),
    }))
}

#[utoipa::path(post, path = "/api/requests", request_body = CreateRequestPayload, responses((status = 200, body = VerificationRequest), (status = 400, description = "Missing required fields")))]
pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<CreateRequestPayload>,
) -> Result<Json<VerificationRequest>> {
    let service = RequestService::new(state.db.clone());
    let request = service.create(&principal, payload).await?;
    Ok(Json(request))
}

#[utoipa::path(get, path = "/api/requests/{id}", responses((status = 200, body = VerificationRequest), (status = 403, description = "Outside caller's visibility"), (status = 404, description = "Unknown request")))]
pub async fn get_request(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<VerificationRequest>> {
    let service = RequestService::new(state.db.clone());
    Ok(Json(service.get(&principal, &id).await?))
}

#[utoipa::path(patch, path = "/api/requests/{id}", request_body = UpdateRequestPayload, responses((status = 200, body = VerificationRequest), (status = 403, description = "Admin only")))]
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRequestPayload>,
) -> Result<Json<VerificationRequest>> {
    let service = RequestService::new(state.db.clone());
    Ok(Json(service.update(&principal, &id, payload).await?))
}
