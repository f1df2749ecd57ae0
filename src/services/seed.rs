use crate::database::sqlite::SqliteDatabase;
use crate::errors::Result;
use crate::models::request::{Priority, RequestStatus, RequestType, VerificationRequest};
use crate::models::user::{OrgType, Organization, Role, User};
use crate::utils::crypto;
use chrono::Utc;
use uuid::Uuid;

/// Seeds a fresh database with one org pair, one user per role and a sample
/// request, for local development and demos.
pub async fn run(db: &SqliteDatabase) -> Result<()> {
    let hq = Organization {
        id: Uuid::new_v4(),
        name: "FieldVerify HQ".to_string(),
        org_type: OrgType::Internal,
        created_at: Utc::now(),
    };
    db.create_organization(&hq).await?;

    let client_org = Organization {
        id: Uuid::new_v4(),
        name: "Sample Client Org".to_string(),
        org_type: OrgType::Client,
        created_at: Utc::now(),
    };
    db.create_organization(&client_org).await?;

    let admin = seed_user(db, "Admin", "admin@fieldverify.in", Role::Admin, &hq, "Admin@123").await?;
    let client = seed_user(db, "Client User", "client@acme.com", Role::Client, &client_org, "Client@123").await?;
    let field = seed_user(db, "Field Agent", "field@fieldverify.in", Role::Field, &hq, "Field@123").await?;

    let request = VerificationRequest {
        id: Uuid::new_v4(),
        request_type: RequestType::Loan,
        requester_id: client.id,
        client_org_id: client_org.id,
        subject_name: "John Doe".to_string(),
        subject_phone: None,
        subject_address: None,
        city: None,
        state: None,
        pincode: None,
        loan_ref_no: None,
        status: RequestStatus::Draft,
        priority: Priority::Normal,
        created_at: Utc::now(),
    };
    db.create_request(&request).await?;

    tracing::info!(
        action = "seed_complete",
        admin = %admin.email,
        client = %client.email,
        field = %field.email,
        request_id = %request.id,
    );
    Ok(())
}

async fn seed_user(
    db: &SqliteDatabase,
    name: &str,
    email: &str,
    role: Role,
    org: &Organization,
    password: &str,
) -> Result<User> {
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        role,
        password_hash: crypto::hash_password(password)?,
        org_id: org.id,
        is_active: true,
        created_at: Utc::now(),
    };
    db.create_user(&user).await?;
    Ok(user)
}
