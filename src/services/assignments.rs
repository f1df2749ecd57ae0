use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::models::assignment::{Assignment, AssignmentStatus, CreateAssignmentPayload};
use crate::models::user::Role;
use crate::services::jwt::Principal;
use crate::services::policy;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct AssignmentService {
    database: Arc<SqliteDatabase>,
}

impl AssignmentService {
    pub fn new(database: Arc<SqliteDatabase>) -> Self {
        Self { database }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        payload: CreateAssignmentPayload,
    ) -> Result<Assignment> {
        principal.require_role(&[Role::Admin])?;

        let (request_id, agent_id) = match (payload.request_id, payload.agent_id) {
            (Some(r), Some(a)) => (r, a),
            _ => return Err(AppError::Validation("Missing required fields".to_string())),
        };

        if self.database.get_request(&request_id).await?.is_none() {
            return Err(AppError::NotFound("Request"));
        }
        let agent = self
            .database
            .get_user_by_id(&agent_id)
            .await?
            .filter(|u| u.role == Role::Field)
            .ok_or_else(|| AppError::Validation("Invalid agent".to_string()))?;

        // Friendly pre-check; the UNIQUE constraint in the store is what
        // actually guarantees one assignment per (request, agent).
        if self
            .database
            .find_assignment(&request_id, &agent_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Agent already assigned to this request".to_string(),
            ));
        }

        let assignment = Assignment {
            id: Uuid::new_v4(),
            request_id,
            agent_id,
            status: AssignmentStatus::Assigned,
            assigned_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        self.database.create_assignment(&assignment).await?;
        tracing::info!(
            action = "assignment_created",
            assignment_id = %assignment.id,
            request_id = %request_id,
            agent_id = %agent.id,
        );
        Ok(assignment)
    }

    pub async fn list_mine(
        &self,
        principal: &Principal,
        status: Option<AssignmentStatus>,
        skip: i64,
        take: i64,
    ) -> Result<(Vec<Assignment>, i64)> {
        principal.require_role(&[Role::Field])?;
        self.database
            .list_assignments_for_agent(&principal.id, status, skip, take)
            .await
    }

    pub async fn get(&self, principal: &Principal, id: &Uuid) -> Result<Assignment> {
        let assignment = self
            .database
            .get_assignment(id)
            .await?
            .ok_or(AppError::NotFound("Assignment"))?;

        match principal.role {
            Role::Admin => {}
            Role::Field => {
                if assignment.agent_id != principal.id {
                    return Err(AppError::AccessDenied);
                }
            }
            // Clients follow the parent request's visibility rule.
            Role::Client => {
                let request = self
                    .database
                    .get_request(&assignment.request_id)
                    .await?
                    .ok_or(AppError::NotFound("Request"))?;
                if !policy::request_visible(principal, &request, false) {
                    return Err(AppError::AccessDenied);
                }
            }
        }
        Ok(assignment)
    }

    /// Validated transition of the assignment state machine. First entry into
    /// IN_PROGRESS stamps started_at; entry into COMPLETED stamps
    /// completed_at.
    pub async fn update_status(
        &self,
        principal: &Principal,
        id: &Uuid,
        new_status: AssignmentStatus,
    ) -> Result<Assignment> {
        principal.require_role(&[Role::Field, Role::Admin])?;

        let mut assignment = self
            .database
            .get_assignment(id)
            .await?
            .ok_or(AppError::NotFound("Assignment"))?;

        if principal.role == Role::Field && assignment.agent_id != principal.id {
            return Err(AppError::AccessDenied);
        }

        if !assignment.status.can_transition(new_status) {
            return Err(AppError::Validation(format!(
                "Invalid status transition {} -> {}",
                assignment.status.as_str(),
                new_status.as_str()
            )));
        }

        if new_status == AssignmentStatus::InProgress && assignment.started_at.is_none() {
            assignment.started_at = Some(Utc::now());
        }
        if new_status == AssignmentStatus::Completed {
            assignment.completed_at = Some(Utc::now());
        }
        assignment.status = new_status;

        self.database.update_assignment(&assignment).await?;
        tracing::info!(
            action = "assignment_status_updated",
            assignment_id = %assignment.id,
            status = assignment.status.as_str(),
            by = %principal.id,
        );
        Ok(assignment)
    }

    pub async fn get_by_request(
        &self,
        principal: &Principal,
        request_id: &Uuid,
    ) -> Result<Vec<Assignment>> {
        principal.require_role(&[Role::Admin])?;
        self.database.list_assignments_for_request(request_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::sqlite::fixtures;
    use crate::models::request::VerificationRequest;
    use crate::models::user::{OrgType, Organization, User};

    fn principal_for(user: &User) -> Principal {
        Principal {
            id: user.id,
            role: user.role,
            org_id: user.org_id,
        }
    }

    struct World {
        service: AssignmentService,
        db: Arc<SqliteDatabase>,
        admin: User,
        client: User,
        agent: User,
        other_agent: User,
        client_org: Organization,
        request: VerificationRequest,
    }

    async fn world() -> World {
        let db = Arc::new(fixtures::db().await);
        let hq = fixtures::org(&db, OrgType::Internal).await;
        let client_org = fixtures::org(&db, OrgType::Client).await;
        let admin = fixtures::user(&db, Role::Admin, &hq, "admin@hq.test").await;
        let client = fixtures::user(&db, Role::Client, &client_org, "client@acme.test").await;
        let agent = fixtures::user(&db, Role::Field, &hq, "field@hq.test").await;
        let other_agent = fixtures::user(&db, Role::Field, &hq, "field2@hq.test").await;
        let request = fixtures::request(&db, &client, &client_org, "John Doe").await;
        World {
            service: AssignmentService::new(db.clone()),
            db,
            admin,
            client,
            agent,
            other_agent,
            client_org,
            request,
        }
    }

    fn payload(request_id: Uuid, agent_id: Uuid) -> CreateAssignmentPayload {
        CreateAssignmentPayload {
            request_id: Some(request_id),
            agent_id: Some(agent_id),
        }
    }

    #[tokio::test]
    async fn create_is_admin_only() {
        let w = world().await;
        let err = w
            .service
            .create(&principal_for(&w.client), payload(w.request.id, w.agent.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn create_validates_request_and_agent() {
        let w = world().await;
        let admin = principal_for(&w.admin);

        let err = w
            .service
            .create(&admin, payload(Uuid::new_v4(), w.agent.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // A non-FIELD user is not a valid agent.
        let err = w
            .service
            .create(&admin, payload(w.request.id, w.client.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_create_yields_one_success_one_conflict() {
        let w = world().await;
        let admin = principal_for(&w.admin);

        let first = w
            .service
            .create(&admin, payload(w.request.id, w.agent.id))
            .await;
        assert!(first.is_ok());

        let second = w
            .service
            .create(&admin, payload(w.request.id, w.agent.id))
            .await
            .unwrap_err();
        assert!(matches!(second, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_mine_is_field_only_and_scoped() {
        let w = world().await;
        let admin = principal_for(&w.admin);
        w.service
            .create(&admin, payload(w.request.id, w.agent.id))
            .await
            .unwrap();
        let second_request =
            fixtures::request(&w.db, &w.client, &w.client_org, "Jane Roe").await;
        w.service
            .create(&admin, payload(second_request.id, w.other_agent.id))
            .await
            .unwrap();

        let (mine, total) = w
            .service
            .list_mine(&principal_for(&w.agent), None, 0, 20)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert!(mine.iter().all(|a| a.agent_id == w.agent.id));

        let err = w
            .service
            .list_mine(&admin, None, 0, 20)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn get_guards_by_role() {
        let w = world().await;
        let admin = principal_for(&w.admin);
        let assignment = w
            .service
            .create(&admin, payload(w.request.id, w.agent.id))
            .await
            .unwrap();

        // Assigned agent and admin can read it.
        assert!(w.service.get(&principal_for(&w.agent), &assignment.id).await.is_ok());
        assert!(w.service.get(&admin, &assignment.id).await.is_ok());

        // Another field agent cannot.
        let err = w
            .service
            .get(&principal_for(&w.other_agent), &assignment.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AccessDenied));

        // Owning-org client can, foreign client cannot.
        assert!(w.service.get(&principal_for(&w.client), &assignment.id).await.is_ok());
        let foreign_org = fixtures::org(&w.db, OrgType::Client).await;
        let foreign = fixtures::user(&w.db, Role::Client, &foreign_org, "f@corp.test").await;
        let err = w
            .service
            .get(&principal_for(&foreign), &assignment.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AccessDenied));
    }

    #[tokio::test]
    async fn transitions_stamp_timestamps_in_order() {
        let w = world().await;
        let admin = principal_for(&w.admin);
        let agent = principal_for(&w.agent);
        let assignment = w
            .service
            .create(&admin, payload(w.request.id, w.agent.id))
            .await
            .unwrap();
        assert!(assignment.started_at.is_none());

        let in_progress = w
            .service
            .update_status(&agent, &assignment.id, AssignmentStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(in_progress.status, AssignmentStatus::InProgress);
        let started_at = in_progress.started_at.expect("started_at stamped");

        let completed = w
            .service
            .update_status(&agent, &assignment.id, AssignmentStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.status, AssignmentStatus::Completed);
        assert!(completed.completed_at.is_some());
        // started_at is stamped once and survives later transitions.
        assert_eq!(completed.started_at, Some(started_at));
    }

    #[tokio::test]
    async fn out_of_order_transition_is_rejected() {
        let w = world().await;
        let admin = principal_for(&w.admin);
        let assignment = w
            .service
            .create(&admin, payload(w.request.id, w.agent.id))
            .await
            .unwrap();

        let err = w
            .service
            .update_status(&admin, &assignment.id, AssignmentStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn cancellation_is_reachable_until_completion() {
        let w = world().await;
        let admin = principal_for(&w.admin);
        let assignment = w
            .service
            .create(&admin, payload(w.request.id, w.agent.id))
            .await
            .unwrap();

        let cancelled = w
            .service
            .update_status(&admin, &assignment.id, AssignmentStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, AssignmentStatus::Cancelled);

        // Terminal: nothing moves out of CANCELLED.
        let err = w
            .service
            .update_status(&admin, &assignment.id, AssignmentStatus::InProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn agents_only_update_their_own() {
        let w = world().await;
        let admin = principal_for(&w.admin);
        let assignment = w
            .service
            .create(&admin, payload(w.request.id, w.agent.id))
            .await
            .unwrap();

        let err = w
            .service
            .update_status(
                &principal_for(&w.other_agent),
                &assignment.id,
                AssignmentStatus::InProgress,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AccessDenied));
    }

    #[tokio::test]
    async fn get_by_request_is_admin_only() {
        let w = world().await;
        let admin = principal_for(&w.admin);
        w.service
            .create(&admin, payload(w.request.id, w.agent.id))
            .await
            .unwrap();
        w.service
            .create(&admin, payload(w.request.id, w.other_agent.id))
            .await
            .unwrap();

        let all = w.service.get_by_request(&admin, &w.request.id).await.unwrap();
        assert_eq!(all.len(), 2);

        let err = w
            .service
            .get_by_request(&principal_for(&w.agent), &w.request.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }
}
