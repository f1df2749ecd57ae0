use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::models::evidence::{Evidence, EvidenceKind};
use crate::models::request::VerificationRequest;
use crate::models::user::Role;
use crate::services::jwt::Principal;
use crate::services::policy;
use crate::storage::{storage_key, ContentStore};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Upload parameters assembled from the multipart form.
#[derive(Debug)]
pub struct UploadEvidenceInput {
    pub request_id: Uuid,
    pub kind: EvidenceKind,
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub gps_lat: Option<f64>,
    pub gps_lng: Option<f64>,
}

pub struct EvidenceService {
    database: Arc<SqliteDatabase>,
    store: Arc<dyn ContentStore>,
}

impl EvidenceService {
    pub fn new(database: Arc<SqliteDatabase>, store: Arc<dyn ContentStore>) -> Self {
        Self { database, store }
    }

    pub async fn upload(
        &self,
        principal: &Principal,
        input: UploadEvidenceInput,
    ) -> Result<Evidence> {
        principal.require_role(&[Role::Field, Role::Admin])?;

        if self.database.get_request(&input.request_id).await?.is_none() {
            return Err(AppError::NotFound("Request"));
        }
        if principal.role == Role::Field {
            self.require_assignment(&input.request_id, principal).await?;
        }

        let key = storage_key(&principal.id, &input.filename)?;
        self.store.put(&key, &input.bytes).await?;

        let evidence = Evidence {
            id: Uuid::new_v4(),
            request_id: input.request_id,
            uploader_id: principal.id,
            kind: input.kind,
            filename: input.filename,
            mime_type: input.mime_type,
            size: input.bytes.len() as i64,
            storage_key: key,
            gps_lat: input.gps_lat,
            gps_lng: input.gps_lng,
            shot_at: Utc::now(),
            created_at: Utc::now(),
        };
        self.database.create_evidence(&evidence).await?;
        tracing::info!(
            action = "evidence_uploaded",
            evidence_id = %evidence.id,
            request_id = %evidence.request_id,
            kind = evidence.kind.as_str(),
            size = evidence.size,
        );
        Ok(evidence)
    }

    pub async fn list_by_request(
        &self,
        principal: &Principal,
        request_id: &Uuid,
        kind: Option<EvidenceKind>,
    ) -> Result<Vec<Evidence>> {
        let request = self
            .database
            .get_request(request_id)
            .await?
            .ok_or(AppError::NotFound("Request"))?;
        self.check_request_visibility(principal, &request).await?;
        self.database.list_evidence_for_request(request_id, kind).await
    }

    pub async fn get(&self, principal: &Principal, id: &Uuid) -> Result<Evidence> {
        let evidence = self
            .database
            .get_evidence(id)
            .await?
            .ok_or(AppError::NotFound("Evidence"))?;
        let request = self
            .database
            .get_request(&evidence.request_id)
            .await?
            .ok_or(AppError::NotFound("Request"))?;
        self.check_request_visibility(principal, &request).await?;
        Ok(evidence)
    }

    /// Removes stored bytes, then the metadata row. Bytes already gone is not
    /// an error; the row still goes away.
    pub async fn delete(&self, principal: &Principal, id: &Uuid) -> Result<()> {
        principal.require_role(&[Role::Field, Role::Admin])?;

        let evidence = self
            .database
            .get_evidence(id)
            .await?
            .ok_or(AppError::NotFound("Evidence"))?;
        if principal.role == Role::Field && evidence.uploader_id != principal.id {
            return Err(AppError::AccessDenied);
        }

        self.store.delete(&evidence.storage_key).await?;
        self.database.delete_evidence(id).await?;
        tracing::info!(action = "evidence_deleted", evidence_id = %id, by = %principal.id);
        Ok(())
    }

    async fn require_assignment(&self, request_id: &Uuid, principal: &Principal) -> Result<()> {
        if self
            .database
            .find_assignment(request_id, &principal.id)
            .await?
            .is_none()
        {
            return Err(AppError::AccessDenied);
        }
        Ok(())
    }

    async fn check_request_visibility(
        &self,
        principal: &Principal,
        request: &VerificationRequest,
    ) -> Result<()> {
        let is_assigned = match principal.role {
            Role::Field => self
                .database
                .find_assignment(&request.id, &principal.id)
                .await?
                .is_some(),
            _ => false,
        };
        if !policy::request_visible(principal, request, is_assigned) {
            return Err(AppError::AccessDenied);
        }
        Ok(())
    }
}
