use crate::models::assignment::Assignment;
use crate::models::request::VerificationRequest;
use crate::models::user::UserSummary;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserSummary,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Pagination {
    pub total: i64,
    pub skip: i64,
    pub take: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(total: i64, skip: i64, take: i64) -> Self {
        Self {
            total,
            skip,
            take,
            // take is clamped to >= 1 before this is built.
            pages: (total + take - 1) / take,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestPage {
    pub data: Vec<VerificationRequest>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentPage {
    pub data: Vec<Assignment>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Common list query. Numbers arrive as raw strings so that absent or
/// non-numeric values fall back to defaults instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub skip: Option<String>,
    pub take: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentsQuery {
    pub org_id: Option<uuid::Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KindQuery {
    pub kind: Option<String>,
}

/// skip defaults to 0; take defaults to 20 and is clamped to [1, 100].
pub fn page_params(skip: Option<&str>, take: Option<&str>) -> (i64, i64) {
    let skip = skip
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0)
        .max(0);
    let take = take
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(20)
        .clamp(1, 100);
    (skip, take)
}
