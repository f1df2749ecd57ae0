use crate::errors::{AppError, Result};
use crate::models::assignment::{Assignment, AssignmentStatus};
use crate::models::evidence::{Evidence, EvidenceKind};
use crate::models::request::{Priority, RequestStatus, RequestType, VerificationRequest};
use crate::models::user::{OrgType, Organization, Role, User};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

/// Role-scoped listing filter for verification requests. The policy layer
/// decides which of `client_org_id` / `agent_id` is set; this layer just
/// translates them into WHERE clauses.
#[derive(Debug, Default)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub search: Option<String>,
    pub client_org_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub skip: i64,
    pub take: i64,
}

impl SqliteDatabase {
    pub async fn new(database_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!("Failed to create database directory: {}", e))
                })?;
            }
        }
        if !Path::new(database_path).exists() {
            std::fs::File::create(database_path).map_err(|e| {
                AppError::Database(format!("Failed to create database file: {}", e))
            })?;
        }

        let database_url = format!("sqlite:{}", database_path);
        let pool = SqlitePool::connect(&database_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        let db = Self { pool };
        db.create_tables().await?;
        tracing::info!(action = "database_ready", path = %database_path);
        Ok(db)
    }

    /// Single-connection in-memory database, used by tests and local tooling.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;
        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    async fn create_tables(&self) -> Result<()> {
        let query = r#"
            CREATE TABLE IF NOT EXISTS organizations (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                org_type TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                phone TEXT,
                role TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                org_id TEXT NOT NULL,
                is_active BOOLEAN DEFAULT TRUE,
                created_at TEXT NOT NULL,
                FOREIGN KEY (org_id) REFERENCES organizations (id)
            );

            CREATE TABLE IF NOT EXISTS requests (
                id TEXT PRIMARY KEY,
                request_type TEXT NOT NULL,
                requester_id TEXT NOT NULL,
                client_org_id TEXT NOT NULL,
                subject_name TEXT NOT NULL,
                subject_phone TEXT,
                subject_address TEXT,
                city TEXT,
                state TEXT,
                pincode TEXT,
                loan_ref_no TEXT,
                status TEXT NOT NULL DEFAULT 'DRAFT',
                priority TEXT NOT NULL DEFAULT 'NORMAL',
                created_at TEXT NOT NULL,
                FOREIGN KEY (requester_id) REFERENCES users (id),
                FOREIGN KEY (client_org_id) REFERENCES organizations (id)
            );

            CREATE TABLE IF NOT EXISTS assignments (
                id TEXT PRIMARY KEY,
                request_id TEXT NOT NULL,
                agent_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'ASSIGNED',
                assigned_at TEXT NOT NULL,
                started_at TEXT,
                completed_at TEXT,
                UNIQUE (request_id, agent_id),
                FOREIGN KEY (request_id) REFERENCES requests (id),
                FOREIGN KEY (agent_id) REFERENCES users (id)
            );

            CREATE TABLE IF NOT EXISTS evidence (
                id TEXT PRIMARY KEY,
                request_id TEXT NOT NULL,
                uploader_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                filename TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                size INTEGER NOT NULL,
                storage_key TEXT NOT NULL,
                gps_lat REAL,
                gps_lng REAL,
                shot_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (request_id) REFERENCES requests (id),
                FOREIGN KEY (uploader_id) REFERENCES users (id)
            );

            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
            CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
            CREATE INDEX IF NOT EXISTS idx_requests_client_org ON requests(client_org_id);
            CREATE INDEX IF NOT EXISTS idx_requests_status ON requests(status);
            CREATE INDEX IF NOT EXISTS idx_requests_created_at ON requests(created_at);
            CREATE INDEX IF NOT EXISTS idx_assignments_request ON assignments(request_id);
            CREATE INDEX IF NOT EXISTS idx_assignments_agent ON assignments(agent_id);
            CREATE INDEX IF NOT EXISTS idx_evidence_request ON evidence(request_id);
        "#;

        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create tables: {}", e)))?;
        Ok(())
    }

    // ---- organizations ----

    pub async fn create_organization(&self, org: &Organization) -> Result<()> {
        sqlx::query("INSERT INTO organizations (id, name, org_type, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(org.id.to_string())
            .bind(&org.name)
            .bind(org.org_type.as_str())
            .bind(org.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create organization: {}", e)))?;
        Ok(())
    }

    pub async fn get_organization(&self, id: &Uuid) -> Result<Option<Organization>> {
        let row = sqlx::query("SELECT * FROM organizations WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_organization(&r)).transpose()
    }

    // ---- users ----

    pub async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, phone, role, password_hash, org_id, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.org_id.to_string())
        .bind(user.is_active)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                AppError::Conflict("Email already registered".to_string())
            } else {
                AppError::Database(format!("Failed to create user: {}", e))
            }
        })?;
        Ok(())
    }

    pub async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Exact match on email or phone; identifiers are not normalized.
    pub async fn get_user_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?1 OR phone = ?1")
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    pub async fn list_users_by_role(&self, role: Role, org_id: Option<&Uuid>) -> Result<Vec<User>> {
        let rows = match org_id {
            Some(org_id) => {
                sqlx::query("SELECT * FROM users WHERE role = ?1 AND org_id = ?2 ORDER BY name")
                    .bind(role.as_str())
                    .bind(org_id.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM users WHERE role = ?1 ORDER BY name")
                    .bind(role.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(row_to_user).collect()
    }

    // ---- verification requests ----

    pub async fn create_request(&self, request: &VerificationRequest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO requests (id, request_type, requester_id, client_org_id, subject_name,
                subject_phone, subject_address, city, state, pincode, loan_ref_no, status, priority, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(request.id.to_string())
        .bind(request.request_type.as_str())
        .bind(request.requester_id.to_string())
        .bind(request.client_org_id.to_string())
        .bind(&request.subject_name)
        .bind(&request.subject_phone)
        .bind(&request.subject_address)
        .bind(&request.city)
        .bind(&request.state)
        .bind(&request.pincode)
        .bind(&request.loan_ref_no)
        .bind(request.status.as_str())
        .bind(request.priority.as_str())
        .bind(request.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create request: {}", e)))?;
        Ok(())
    }

    pub async fn get_request(&self, id: &Uuid) -> Result<Option<VerificationRequest>> {
        let row = sqlx::query("SELECT * FROM requests WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_request(&r)).transpose()
    }

    pub async fn update_request(&self, request: &VerificationRequest) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE requests SET subject_name = ?2, subject_phone = ?3, subject_address = ?4,
                city = ?5, state = ?6, pincode = ?7, loan_ref_no = ?8, status = ?9, priority = ?10
            WHERE id = ?1
            "#,
        )
        .bind(request.id.to_string())
        .bind(&request.subject_name)
        .bind(&request.subject_phone)
        .bind(&request.subject_address)
        .bind(&request.city)
        .bind(&request.state)
        .bind(&request.pincode)
        .bind(&request.loan_ref_no)
        .bind(request.status.as_str())
        .bind(request.priority.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update request: {}", e)))?;
        Ok(())
    }

    /// Filtered page of requests plus the unpaged total, newest first.
    /// Search matches subject name, id, or loan reference, case-insensitively.
    pub async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<(Vec<VerificationRequest>, i64)> {
        let mut clauses = String::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            clauses.push_str(" AND status = ?");
            binds.push(status.as_str().to_string());
        }
        if let Some(search) = &filter.search {
            clauses.push_str(
                " AND (instr(lower(subject_name), ?) > 0 OR instr(lower(id), ?) > 0 OR instr(lower(ifnull(loan_ref_no, '')), ?) > 0)",
            );
            let needle = search.to_lowercase();
            binds.push(needle.clone());
            binds.push(needle.clone());
            binds.push(needle);
        }
        if let Some(org_id) = filter.client_org_id {
            clauses.push_str(" AND client_org_id = ?");
            binds.push(org_id.to_string());
        }
        if let Some(agent_id) = filter.agent_id {
            clauses.push_str(
                " AND EXISTS (SELECT 1 FROM assignments WHERE assignments.request_id = requests.id AND assignments.agent_id = ?)",
            );
            binds.push(agent_id.to_string());
        }

        let list_sql = format!(
            "SELECT * FROM requests WHERE 1=1{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            clauses
        );
        let count_sql = format!("SELECT COUNT(*) as count FROM requests WHERE 1=1{}", clauses);

        let mut list_query = sqlx::query(&list_sql);
        for bind in &binds {
            list_query = list_query.bind(bind);
        }
        let rows = list_query
            .bind(filter.take)
            .bind(filter.skip)
            .fetch_all(&self.pool)
            .await?;

        let mut count_query = sqlx::query(&count_sql);
        for bind in &binds {
            count_query = count_query.bind(bind);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?.get("count");

        let requests = rows.iter().map(row_to_request).collect::<Result<Vec<_>>>()?;
        Ok((requests, total))
    }

    // ---- assignments ----

    /// Inserts a new assignment. The UNIQUE (request_id, agent_id) constraint
    /// closes the race two concurrent creates would otherwise win together.
    pub async fn create_assignment(&self, assignment: &Assignment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO assignments (id, request_id, agent_id, status, assigned_at, started_at, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(assignment.id.to_string())
        .bind(assignment.request_id.to_string())
        .bind(assignment.agent_id.to_string())
        .bind(assignment.status.as_str())
        .bind(assignment.assigned_at.to_rfc3339())
        .bind(assignment.started_at.map(|t| t.to_rfc3339()))
        .bind(assignment.completed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                AppError::Conflict("Agent already assigned to this request".to_string())
            } else {
                AppError::Database(format!("Failed to create assignment: {}", e))
            }
        })?;
        Ok(())
    }

    pub async fn get_assignment(&self, id: &Uuid) -> Result<Option<Assignment>> {
        let row = sqlx::query("SELECT * FROM assignments WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_assignment(&r)).transpose()
    }

    pub async fn find_assignment(
        &self,
        request_id: &Uuid,
        agent_id: &Uuid,
    ) -> Result<Option<Assignment>> {
        let row = sqlx::query("SELECT * FROM assignments WHERE request_id = ?1 AND agent_id = ?2")
            .bind(request_id.to_string())
            .bind(agent_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_assignment(&r)).transpose()
    }

    pub async fn update_assignment(&self, assignment: &Assignment) -> Result<()> {
        sqlx::query(
            "UPDATE assignments SET status = ?2, started_at = ?3, completed_at = ?4 WHERE id = ?1",
        )
        .bind(assignment.id.to_string())
        .bind(assignment.status.as_str())
        .bind(assignment.started_at.map(|t| t.to_rfc3339()))
        .bind(assignment.completed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update assignment: {}", e)))?;
        Ok(())
    }

    pub async fn list_assignments_for_agent(
        &self,
        agent_id: &Uuid,
        status: Option<AssignmentStatus>,
        skip: i64,
        take: i64,
    ) -> Result<(Vec<Assignment>, i64)> {
        let (rows, total) = match status {
            Some(status) => {
                let rows = sqlx::query(
                    "SELECT * FROM assignments WHERE agent_id = ?1 AND status = ?2 ORDER BY assigned_at DESC LIMIT ?3 OFFSET ?4",
                )
                .bind(agent_id.to_string())
                .bind(status.as_str())
                .bind(take)
                .bind(skip)
                .fetch_all(&self.pool)
                .await?;
                let total: i64 = sqlx::query(
                    "SELECT COUNT(*) as count FROM assignments WHERE agent_id = ?1 AND status = ?2",
                )
                .bind(agent_id.to_string())
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await?
                .get("count");
                (rows, total)
            }
            None => {
                let rows = sqlx::query(
                    "SELECT * FROM assignments WHERE agent_id = ?1 ORDER BY assigned_at DESC LIMIT ?2 OFFSET ?3",
                )
                .bind(agent_id.to_string())
                .bind(take)
                .bind(skip)
                .fetch_all(&self.pool)
                .await?;
                let total: i64 =
                    sqlx::query("SELECT COUNT(*) as count FROM assignments WHERE agent_id = ?1")
                        .bind(agent_id.to_string())
                        .fetch_one(&self.pool)
                        .await?
                        .get("count");
                (rows, total)
            }
        };
        let assignments = rows.iter().map(row_to_assignment).collect::<Result<Vec<_>>>()?;
        Ok((assignments, total))
    }

    pub async fn list_assignments_for_request(&self, request_id: &Uuid) -> Result<Vec<Assignment>> {
        let rows = sqlx::query("SELECT * FROM assignments WHERE request_id = ?1 ORDER BY assigned_at DESC")
            .bind(request_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_assignment).collect()
    }

    // ---- evidence ----

    pub async fn create_evidence(&self, evidence: &Evidence) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO evidence (id, request_id, uploader_id, kind, filename, mime_type, size,
                storage_key, gps_lat, gps_lng, shot_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(evidence.id.to_string())
        .bind(evidence.request_id.to_string())
        .bind(evidence.uploader_id.to_string())
        .bind(evidence.kind.as_str())
        .bind(&evidence.filename)
        .bind(&evidence.mime_type)
        .bind(evidence.size)
        .bind(&evidence.storage_key)
        .bind(evidence.gps_lat)
        .bind(evidence.gps_lng)
        .bind(evidence.shot_at.to_rfc3339())
        .bind(evidence.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create evidence: {}", e)))?;
        Ok(())
    }

    pub async fn get_evidence(&self, id: &Uuid) -> Result<Option<Evidence>> {
        let row = sqlx::query("SELECT * FROM evidence WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_evidence(&r)).transpose()
    }

    pub async fn list_evidence_for_request(
        &self,
        request_id: &Uuid,
        kind: Option<EvidenceKind>,
    ) -> Result<Vec<Evidence>> {
        let rows = match kind {
            Some(kind) => {
                sqlx::query(
                    "SELECT * FROM evidence WHERE request_id = ?1 AND kind = ?2 ORDER BY created_at DESC",
                )
                .bind(request_id.to_string())
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM evidence WHERE request_id = ?1 ORDER BY created_at DESC")
                    .bind(request_id.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(row_to_evidence).collect()
    }

    pub async fn delete_evidence(&self, id: &Uuid) -> Result<()> {
        sqlx::query("DELETE FROM evidence WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete evidence: {}", e)))?;
        Ok(())
    }
}

// ---- row mapping ----

fn parse_uuid(value: String, field: &str) -> Result<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|e| AppError::Database(format!("Invalid {} in row: {}", field, e)))
}

fn parse_timestamp(value: String, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AppError::Database(format!("Invalid {} in row: {}", field, e)))
}

fn parse_timestamp_opt(value: Option<String>, field: &str) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(v, field)).transpose()
}

fn row_to_organization(row: &SqliteRow) -> Result<Organization> {
    Ok(Organization {
        id: parse_uuid(row.get("id"), "organization id")?,
        name: row.get("name"),
        org_type: OrgType::parse(&row.get::<String, _>("org_type"))
            .ok_or_else(|| AppError::Database("Invalid org_type in row".to_string()))?,
        created_at: parse_timestamp(row.get("created_at"), "created_at")?,
    })
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: parse_uuid(row.get("id"), "user id")?,
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        role: Role::parse(&row.get::<String, _>("role"))
            .ok_or_else(|| AppError::Database("Invalid role in row".to_string()))?,
        password_hash: row.get("password_hash"),
        org_id: parse_uuid(row.get("org_id"), "org id")?,
        is_active: row.get("is_active"),
        created_at: parse_timestamp(row.get("created_at"), "created_at")?,
    })
}

fn row_to_request(row: &SqliteRow) -> Result<VerificationRequest> {
    Ok(VerificationRequest {
        id: parse_uuid(row.get("id"), "request id")?,
        request_type: RequestType::parse(&row.get::<String, _>("request_type"))
            .ok_or_else(|| AppError::Database("Invalid request_type in row".to_string()))?,
        requester_id: parse_uuid(row.get("requester_id"), "requester id")?,
        client_org_id: parse_uuid(row.get("client_org_id"), "client org id")?,
        subject_name: row.get("subject_name"),
        subject_phone: row.get("subject_phone"),
        subject_address: row.get("subject_address"),
        city: row.get("city"),
        state: row.get("state"),
        pincode: row.get("pincode"),
        loan_ref_no: row.get("loan_ref_no"),
        status: RequestStatus::parse(&row.get::<String, _>("status"))
            .ok_or_else(|| AppError::Database("Invalid status in row".to_string()))?,
        priority: Priority::parse(&row.get::<String, _>("priority"))
            .ok_or_else(|| AppError::Database("Invalid priority in row".to_string()))?,
        created_at: parse_timestamp(row.get("created_at"), "created_at")?,
    })
}

fn row_to_assignment(row: &SqliteRow) -> Result<Assignment> {
    Ok(Assignment {
        id: parse_uuid(row.get("id"), "assignment id")?,
        request_id: parse_uuid(row.get("request_id"), "request id")?,
        agent_id: parse_uuid(row.get("agent_id"), "agent id")?,
        status: AssignmentStatus::parse(&row.get::<String, _>("status"))
            .ok_or_else(|| AppError::Database("Invalid status in row".to_string()))?,
        assigned_at: parse_timestamp(row.get("assigned_at"), "assigned_at")?,
        started_at: parse_timestamp_opt(row.get("started_at"), "started_at")?,
        completed_at: parse_timestamp_opt(row.get("completed_at"), "completed_at")?,
    })
}

fn row_to_evidence(row: &SqliteRow) -> Result<Evidence> {
    Ok(Evidence {
        id: parse_uuid(row.get("id"), "evidence id")?,
        request_id: parse_uuid(row.get("request_id"), "request id")?,
        uploader_id: parse_uuid(row.get("uploader_id"), "uploader id")?,
        kind: EvidenceKind::parse(&row.get::<String, _>("kind"))
            .ok_or_else(|| AppError::Database("Invalid kind in row".to_string()))?,
        filename: row.get("filename"),
        mime_type: row.get("mime_type"),
        size: row.get("size"),
        storage_key: row.get("storage_key"),
        gps_lat: row.get("gps_lat"),
        gps_lng: row.get("gps_lng"),
        shot_at: parse_timestamp(row.get("shot_at"), "shot_at")?,
        created_at: parse_timestamp(row.get("created_at"), "created_at")?,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;

    #[tokio::test]
    async fn duplicate_assignment_hits_unique_constraint() {
        let db = fixtures::db().await;
        let org = fixtures::org(&db, OrgType::Client).await;
        let client = fixtures::user(&db, Role::Client, &org, "client@acme.test").await;
        let agent = fixtures::user(&db, Role::Field, &org, "agent@hq.test").await;
        let request = fixtures::request(&db, &client, &org, "John Doe").await;
        fixtures::assignment(&db, &request, &agent).await;

        let duplicate = Assignment {
            id: Uuid::new_v4(),
            request_id: request.id,
            agent_id: agent.id,
            status: AssignmentStatus::Assigned,
            assigned_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        let err = db.create_assignment(&duplicate).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_name_id_and_loan_ref() {
        let db = fixtures::db().await;
        let org = fixtures::org(&db, OrgType::Client).await;
        let client = fixtures::user(&db, Role::Client, &org, "client@acme.test").await;
        let matched = fixtures::request(&db, &client, &org, "John Doe").await;
        fixtures::request(&db, &client, &org, "Someone Else").await;

        let filter = RequestFilter {
            search: Some("JOHN".to_string()),
            skip: 0,
            take: 20,
            ..Default::default()
        };
        let (found, total) = db.list_requests(&filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].id, matched.id);

        // Substring of the id also matches.
        let fragment = matched.id.to_string()[..8].to_uppercase();
        let filter = RequestFilter {
            search: Some(fragment),
            skip: 0,
            take: 20,
            ..Default::default()
        };
        let (found, _) = db.list_requests(&filter).await.unwrap();
        assert!(found.iter().any(|r| r.id == matched.id));
    }

    #[tokio::test]
    async fn identifier_lookup_matches_email_or_phone() {
        let db = fixtures::db().await;
        let org = fixtures::org(&db, OrgType::Internal).await;
        let mut user = fixtures::user(&db, Role::Admin, &org, "admin@hq.test").await;
        user.phone = Some("+911234567890".to_string());
        // Re-insert with a phone for the lookup test.
        let user_with_phone = User {
            id: Uuid::new_v4(),
            email: "second@hq.test".to_string(),
            phone: Some("+919999999999".to_string()),
            ..user.clone()
        };
        db.create_user(&user_with_phone).await.unwrap();

        let by_email = db.get_user_by_identifier("admin@hq.test").await.unwrap();
        assert_eq!(by_email.unwrap().email, "admin@hq.test");

        let by_phone = db.get_user_by_identifier("+919999999999").await.unwrap();
        assert_eq!(by_phone.unwrap().id, user_with_phone.id);

        assert!(db.get_user_by_identifier("nobody@hq.test").await.unwrap().is_none());
    }
}
