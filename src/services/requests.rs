use crate::database::sqlite::{RequestFilter, SqliteDatabase};
use crate::errors::{AppError, Result};
use crate::models::request::{
    CreateRequestPayload, Priority, RequestStatus, UpdateRequestPayload, VerificationRequest,
};
use crate::models::user::Role;
use crate::services::jwt::Principal;
use crate::services::policy;
use crate::utils::validation::Validator;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct RequestService {
    database: Arc<SqliteDatabase>,
}

impl RequestService {
    pub fn new(database: Arc<SqliteDatabase>) -> Self {
        Self { database }
    }

    /// Role-scoped listing: CLIENT is narrowed to its org, FIELD to requests
    /// with an assignment referencing the caller, ADMIN is unrestricted.
    pub async fn list(
        &self,
        principal: &Principal,
        status: Option<RequestStatus>,
        search: Option<String>,
        skip: i64,
        take: i64,
    ) -> Result<(Vec<VerificationRequest>, i64)> {
        let mut filter = RequestFilter {
            status,
            search,
            skip,
            take,
            ..Default::default()
        };
        match principal.role {
            Role::Admin => {}
            Role::Client => filter.client_org_id = Some(principal.org_id),
            Role::Field => filter.agent_id = Some(principal.id),
        }
        self.database.list_requests(&filter).await
    }

    pub async fn create(
        &self,
        principal: &Principal,
        payload: CreateRequestPayload,
    ) -> Result<VerificationRequest> {
        principal.require_role(&[Role::Client, Role::Admin])?;

        let (request_type, requester_id, subject_name) = match (
            payload.request_type,
            payload.requester_id,
            payload.subject_name.filter(|s| !s.trim().is_empty()),
        ) {
            (Some(t), Some(r), Some(s)) => (t, r, s),
            _ => return Err(AppError::Validation("Missing required fields".to_string())),
        };

        if let Some(phone) = &payload.subject_phone {
            Validator::validate_phone(phone)?;
        }
        if let Some(pincode) = &payload.pincode {
            Validator::validate_pincode(pincode)?;
        }

        let request = VerificationRequest {
            id: Uuid::new_v4(),
            request_type,
            requester_id,
            client_org_id: payload.client_org_id.unwrap_or(principal.org_id),
            subject_name,
            subject_phone: payload.subject_phone,
            subject_address: payload.subject_address,
            city: payload.city,
            state: payload.state,
            pincode: payload.pincode,
            loan_ref_no: payload.loan_ref_no,
            status: RequestStatus::Draft,
            priority: payload.priority.unwrap_or(Priority::Normal),
            created_at: Utc::now(),
        };
        self.database.create_request(&request).await?;
        tracing::info!(action = "request_created", request_id = %request.id, by = %principal.id);
        Ok(request)
    }

    pub async fn get(&self, principal: &Principal, id: &Uuid) -> Result<VerificationRequest> {
        let request = self
            .database
            .get_request(id)
            .await?
            .ok_or(AppError::NotFound("Request"))?;

        let is_assigned = match principal.role {
            Role::Field => self
                .database
                .find_assignment(id, &principal.id)
                .await?
                .is_some(),
            _ => false,
        };
        if !policy::request_visible(principal, &request, is_assigned) {
            return Err(AppError::AccessDenied);
        }
        Ok(request)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &Uuid,
        patch: UpdateRequestPayload,
    ) -> Result<VerificationRequest> {
        principal.require_role(&[Role::Admin])?;

        let mut request = self
            .database
            .get_request(id)
            .await?
            .ok_or(AppError::NotFound("Request"))?;

        if let Some(phone) = &patch.subject_phone {
            Validator::validate_phone(phone)?;
        }
        if let Some(pincode) = &patch.pincode {
            Validator::validate_pincode(pincode)?;
        }

        if let Some(v) = patch.subject_name {
            request.subject_name = v;
        }
        if let Some(v) = patch.subject_phone {
            request.subject_phone = Some(v);
        }
        if let Some(v) = patch.subject_address {
            request.subject_address = Some(v);
        }
        if let Some(v) = patch.city {
            request.city = Some(v);
        }
        if let Some(v) = patch.state {
            request.state = Some(v);
        }
        if let Some(v) = patch.pincode {
            request.pincode = Some(v);
        }
        if let Some(v) = patch.loan_ref_no {
            request.loan_ref_no = Some(v);
        }
        if let Some(v) = patch.status {
            request.status = v;
        }
        if let Some(v) = patch.priority {
            request.priority = v;
        }

        self.database.update_request(&request).await?;
        tracing::info!(action = "request_updated", request_id = %request.id, by = %principal.id);
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::sqlite::fixtures;
    use crate::models::request::RequestType;
    use crate::models::user::{OrgType, Organization, User};

    fn principal_for(user: &User) -> Principal {
        Principal {
            id: user.id,
            role: user.role,
            org_id: user.org_id,
        }
    }

    struct World {
        service: RequestService,
        db: Arc<SqliteDatabase>,
        admin: User,
        client: User,
        agent: User,
        client_org: Organization,
        other_org: Organization,
    }

    async fn world() -> World {
        let db = Arc::new(fixtures::db().await);
        let hq = fixtures::org(&db, OrgType::Internal).await;
        let client_org = fixtures::org(&db, OrgType::Client).await;
        let other_org = fixtures::org(&db, OrgType::Client).await;
        let admin = fixtures::user(&db, Role::Admin, &hq, "admin@hq.test").await;
        let client = fixtures::user(&db, Role::Client, &client_org, "client@acme.test").await;
        let agent = fixtures::user(&db, Role::Field, &hq, "field@hq.test").await;
        World {
            service: RequestService::new(db.clone()),
            db,
            admin,
            client,
            agent,
            client_org,
            other_org,
        }
    }

    fn create_payload(requester_id: Uuid) -> CreateRequestPayload {
        CreateRequestPayload {
            request_type: Some(RequestType::Loan),
            requester_id: Some(requester_id),
            client_org_id: None,
            subject_name: Some("John Doe".to_string()),
            subject_phone: None,
            subject_address: None,
            city: None,
            state: None,
            pincode: None,
            loan_ref_no: None,
            priority: None,
        }
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let w = world().await;
        let request = w
            .service
            .create(&principal_for(&w.client), create_payload(w.client.id))
            .await
            .unwrap();

        assert_eq!(request.status, RequestStatus::Draft);
        assert_eq!(request.priority, Priority::Normal);
        // clientOrgId defaults to the caller's org when omitted.
        assert_eq!(request.client_org_id, w.client.org_id);
    }

    #[tokio::test]
    async fn create_requires_type_requester_and_subject() {
        let w = world().await;
        let mut payload = create_payload(w.client.id);
        payload.subject_name = None;
        let err = w
            .service
            .create(&principal_for(&w.client), payload)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn field_agents_cannot_create() {
        let w = world().await;
        let err = w
            .service
            .create(&principal_for(&w.agent), create_payload(w.agent.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn client_list_never_leaks_other_orgs() {
        let w = world().await;
        fixtures::request(&w.db, &w.client, &w.client_org, "Own Request").await;
        let foreign_client =
            fixtures::user(&w.db, Role::Client, &w.other_org, "other@corp.test").await;
        fixtures::request(&w.db, &foreign_client, &w.other_org, "Foreign Request").await;

        let (own, total) = w
            .service
            .list(&principal_for(&w.client), None, None, 0, 20)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert!(own.iter().all(|r| r.client_org_id == w.client.org_id));

        // Admin sees both.
        let (_, admin_total) = w
            .service
            .list(&principal_for(&w.admin), None, None, 0, 20)
            .await
            .unwrap();
        assert_eq!(admin_total, 2);
    }

    #[tokio::test]
    async fn field_list_is_scoped_to_assignments() {
        let w = world().await;
        let assigned = fixtures::request(&w.db, &w.client, &w.client_org, "Assigned").await;
        fixtures::request(&w.db, &w.client, &w.client_org, "Unassigned").await;
        fixtures::assignment(&w.db, &assigned, &w.agent).await;

        let (visible, total) = w
            .service
            .list(&principal_for(&w.agent), None, None, 0, 20)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(visible[0].id, assigned.id);
    }

    #[tokio::test]
    async fn get_enforces_visibility() {
        let w = world().await;
        let request = fixtures::request(&w.db, &w.client, &w.client_org, "John Doe").await;

        // Owning client sees it.
        assert!(w.service.get(&principal_for(&w.client), &request.id).await.is_ok());

        // A client from another org is denied.
        let foreign_client =
            fixtures::user(&w.db, Role::Client, &w.other_org, "other@corp.test").await;
        let err = w
            .service
            .get(&principal_for(&foreign_client), &request.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AccessDenied));

        // Field agent is denied until assigned.
        let err = w
            .service
            .get(&principal_for(&w.agent), &request.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AccessDenied));
        fixtures::assignment(&w.db, &request, &w.agent).await;
        assert!(w.service.get(&principal_for(&w.agent), &request.id).await.is_ok());
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let w = world().await;
        let err = w
            .service
            .get(&principal_for(&w.admin), &Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_is_admin_only_and_partial() {
        let w = world().await;
        let request = fixtures::request(&w.db, &w.client, &w.client_org, "John Doe").await;

        let err = w
            .service
            .update(
                &principal_for(&w.client),
                &request.id,
                UpdateRequestPayload::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let patch = UpdateRequestPayload {
            status: Some(RequestStatus::OnHold),
            priority: Some(Priority::Urgent),
            ..Default::default()
        };
        let updated = w
            .service
            .update(&principal_for(&w.admin), &request.id, patch)
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::OnHold);
        assert_eq!(updated.priority, Priority::Urgent);
        // Untouched fields survive.
        assert_eq!(updated.subject_name, "John Doe");
    }
}
