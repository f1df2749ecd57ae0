use crate::api::types::{page_params, AssignmentPage, ListQuery, Pagination};
use crate::api::AppState;
use crate::errors::{AppError, Result};
use crate::models::assignment::{
    Assignment, AssignmentStatus, CreateAssignmentPayload, UpdateAssignmentStatusPayload,
};
use crate::services::assignments::AssignmentService;
use crate::services::jwt::Principal;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/my-assignments", get(my_assignments))
        .route("/:id", get(get_assignment))
        .route("/:id/status", axum::routing::patch(update_status))
        .route("/request/:request_id", get(by_request))
}

#[utoipa::path(post, path = "/api/assignments", request_body = CreateAssignmentPayload, responses((status = 200, body = Assignment), (status = 409, description = "Agent already assigned")))]
pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<CreateAssignmentPayload>,
) -> Result<Json<Assignment>> {
    let service = AssignmentService::new(state.db.clone());
    Ok(Json(service.create(&principal, payload).await?))
}

#[utoipa::path(get, path = "/api/assignments/my-assignments", responses((status = 200, body = AssignmentPage), (status = 403, description = "Field agents only")))]
pub async fn my_assignments(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> Result<Json<AssignmentPage>> {
    let (skip, take) = page_params(query.skip.as_deref(), query.take.as_deref());
    let status = query
        .status
        .as_deref()
        .map(|s| {
            AssignmentStatus::parse(s)
                .ok_or_else(|| AppError::Validation("Invalid status".to_string()))
        })
        .transpose()?;

    let service = AssignmentService::new(state.db.clone());
    let (data, total) = service.list_mine(&principal, status, skip, take).await?;
    Ok(Json(AssignmentPage {
        data,
        pagination: Pagination::new(total, skip, take),
    }))
}

#[utoipa::path(get, path = "/api/assignments/{id}", responses((status = 200, body = Assignment), (status = 404, description = "Unknown assignment")))]
pub async fn get_assignment(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Assignment>> {
    let service = AssignmentService::new(state.db.clone());
    Ok(Json(service.get(&principal, &id).await?))
}

#[utoipa::path(patch, path = "/api/assignments/{id}/status", request_body = UpdateAssignmentStatusPayload, responses((status = 200, body = Assignment), (status = 400, description = "Illegal transition")))]
pub async fn update_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAssignmentStatusPayload>,
) -> Result<Json<Assignment>> {
    let service = AssignmentService::new(state.db.clone());
    Ok(Json(service.update_status(&principal, &id, payload.status).await?))
}

#[utoipa::path(get, path = "/api/assignments/request/{request_id}", responses((status = 200, body = [Assignment]), (status = 403, description = "Admin only")))]
pub async fn by_request(
    State(state): State<AppState>,
    principal: Principal,
    Path(request_id): Path<Uuid>,
) -> Result<Json<Vec<Assignment>>> {
    let service = AssignmentService::new(state.db.clone());
    Ok(Json(service.get_by_request(&principal, &request_id).await?))
}
