use crate::config::Config;
use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::services::jwt::JwtManager;
use crate::storage::{ContentStore, LocalDiskStore};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, options};
use axum::{Json, Router};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

mod assignments;
mod auth;
mod evidence;
mod extract;
mod requests;
pub mod types;
mod users;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqliteDatabase>,
    pub jwt: Arc<JwtManager>,
    pub store: Arc<dyn ContentStore>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        auth::refresh,
        users::me,
        users::agents,
        users::clients,
        users::get_user,
        requests::list,
        requests::create,
        requests::get_request,
        requests::update,
        assignments::create,
        assignments::my_assignments,
        assignments::get_assignment,
        assignments::update_status,
        assignments::by_request,
        evidence::upload,
        evidence::by_request,
        evidence::get_evidence,
        evidence::delete,
    ),
    components(
        schemas(
            types::LoginRequest,
            types::LoginResponse,
            types::RefreshRequest,
            types::RefreshResponse,
            types::Pagination,
            types::RequestPage,
            types::AssignmentPage,
            types::DeleteResponse,
            crate::models::user::Role,
            crate::models::user::OrgType,
            crate::models::user::Organization,
            crate::models::user::UserResponse,
            crate::models::user::UserSummary,
            crate::models::request::RequestType,
            crate::models::request::RequestStatus,
            crate::models::request::Priority,
            crate::models::request::VerificationRequest,
            crate::models::request::CreateRequestPayload,
            crate::models::request::UpdateRequestPayload,
            crate::models::assignment::AssignmentStatus,
            crate::models::assignment::Assignment,
            crate::models::assignment::CreateAssignmentPayload,
            crate::models::assignment::UpdateAssignmentStatusPayload,
            crate::models::evidence::EvidenceKind,
            crate::models::evidence::Evidence,
        )
    ),
    tags(
        (name = "Auth", description = "Login and token refresh"),
        (name = "Users", description = "Current user and admin directory lookups"),
        (name = "Requests", description = "Verification request registry"),
        (name = "Assignments", description = "Field agent assignment workflow"),
        (name = "Evidence", description = "Captured evidence files")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
        openapi.security = Some(vec![utoipa::openapi::security::SecurityRequirement::new(
            "bearerAuth",
            Vec::<String>::new(),
        )]);
    }
}

pub async fn request_id_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let request_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(request_id.clone());
    let span = tracing::info_span!("request", request_id = %request_id, method = %req.method(), uri = %req.uri());
    let _enter = span.enter();
    next.run(req).await
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

pub fn router(state: AppState) -> Router {
    let openapi = ApiDoc::openapi();

    Router::new()
        .route("/*path", options(|| async { StatusCode::NO_CONTENT }))
        .nest("/api/auth", auth::router())
        .nest("/api/users", users::router())
        .nest("/api/requests", requests::router())
        .nest("/api/assignments", assignments::router())
        .nest("/api/evidence", evidence::router())
        .route("/health", get(health_check))
        .route("/api/openapi.json", get(openapi_json))
        .merge(SwaggerUi::new("/api/docs").url("/api/api-docs.json", openapi))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Builds the application from configuration and serves it until shutdown.
pub async fn serve(config: Config) -> Result<()> {
    let db = Arc::new(SqliteDatabase::new(&config.database_path).await?);
    let jwt = Arc::new(JwtManager::from_config(&config));
    let store: Arc<dyn ContentStore> = Arc::new(LocalDiskStore::new(&config.upload_dir));

    let state = AppState {
        db,
        jwt,
        store,
    };
    let app = router(state).layer(cors_layer(&config));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid listen address: {}", e)))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(action = "server_started", addr = %addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;
    Ok(())
}

async fn health_check() -> impl IntoResponse {
    "OK"
}

async fn openapi_json() -> Json<Value> {
    let openapi = ApiDoc::openapi();
    Json(serde_json::to_value(openapi).unwrap_or(Value::Null))
}
