use crate::api::types::{DeleteResponse, KindQuery};
use crate::api::AppState;
use crate::errors::{AppError, Result};
use crate::models::evidence::{Evidence, EvidenceKind};
use crate::services::evidence::{EvidenceService, UploadEvidenceInput};
use crate::services::jwt::Principal;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/request/:request_id", get(by_request))
        .route("/:id", get(get_evidence))
        .route("/:id/delete", post(delete))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Multipart upload: `file` plus `requestId` and `kind` fields, with optional
/// `gpsLat`/`gpsLng` from the capture device.
#[utoipa::path(post, path = "/api/evidence/upload", responses((status = 200, body = Evidence), (status = 400, description = "Missing file or fields"), (status = 403, description = "Not assigned to this request")))]
pub async fn upload(
    State(state): State<AppState>,
    principal: Principal,
    mut multipart: Multipart,
) -> Result<Json<Evidence>> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut request_id: Option<Uuid> = None;
    let mut kind: Option<EvidenceKind> = None;
    let mut gps_lat: Option<f64> = None;
    let mut gps_lng: Option<f64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .unwrap_or("upload.bin")
                    .to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {}", e)))?;
                file = Some((filename, mime_type, bytes.to_vec()));
            }
            "requestId" => {
                let text = read_text(field).await?;
                request_id = Some(
                    Uuid::parse_str(&text)
                        .map_err(|_| AppError::Validation("Invalid requestId".to_string()))?,
                );
            }
            "kind" => {
                let text = read_text(field).await?;
                kind = Some(
                    EvidenceKind::parse(&text)
                        .ok_or_else(|| AppError::Validation("Invalid kind".to_string()))?,
                );
            }
            "gpsLat" => gps_lat = Some(read_float(field, "gpsLat").await?),
            "gpsLng" => gps_lng = Some(read_float(field, "gpsLng").await?),
            _ => {}
        }
    }

    let (filename, mime_type, bytes) =
        file.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let (request_id, kind) = match (request_id, kind) {
        (Some(r), Some(k)) => (r, k),
        _ => return Err(AppError::Validation("Missing required fields".to_string())),
    };

    let service = EvidenceService::new(state.db.clone(), state.store.clone());
    let evidence = service
        .upload(
            &principal,
            UploadEvidenceInput {
                request_id,
                kind,
                filename,
                mime_type,
                bytes,
                gps_lat,
                gps_lng,
            },
        )
        .await?;
    Ok(Json(evidence))
}

#[utoipa::path(get, path = "/api/evidence/request/{request_id}", responses((status = 200, body = [Evidence]), (status = 403, description = "Outside caller's visibility")))]
pub async fn by_request(
    State(state): State<AppState>,
    principal: Principal,
    Path(request_id): Path<Uuid>,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<Evidence>>> {
    let kind = query
        .kind
        .as_deref()
        .map(|k| EvidenceKind::parse(k).ok_or_else(|| AppError::Validation("Invalid kind".to_string())))
        .transpose()?;
    let service = EvidenceService::new(state.db.clone(), state.store.clone());
    Ok(Json(service.list_by_request(&principal, &request_id, kind).await?))
}

#[utoipa::path(get, path = "/api/evidence/{id}", responses((status = 200, body = Evidence), (status = 404, description = "Unknown evidence")))]
pub async fn get_evidence(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Evidence>> {
    let service = EvidenceService::new(state.db.clone(), state.store.clone());
    Ok(Json(service.get(&principal, &id).await?))
}

#[utoipa::path(post, path = "/api/evidence/{id}/delete", responses((status = 200, body = DeleteResponse), (status = 403, description = "Uploader or admin only")))]
pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>> {
    let service = EvidenceService::new(state.db.clone(), state.store.clone());
    service.delete(&principal, &id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart field: {}", e)))
}

async fn read_float(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<f64> {
    let text = read_text(field).await?;
    text.trim()
        .parse::<f64>()
        .map_err(|_| AppError::Validation(format!("Invalid {}", name)))
}
