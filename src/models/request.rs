use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Service categories offered by the verification desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Loan,
    Insurance,
    Vehicle,
    Asset,
    Documents,
    Vendor,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Loan => "loan",
            RequestType::Insurance => "insurance",
            RequestType::Vehicle => "vehicle",
            RequestType::Asset => "asset",
            RequestType::Documents => "documents",
            RequestType::Vendor => "vendor",
        }
    }

    pub fn parse(s: &str) -> Option<RequestType> {
        match s {
            "loan" => Some(RequestType::Loan),
            "insurance" => Some(RequestType::Insurance),
            "vehicle" => Some(RequestType::Vehicle),
            "asset" => Some(RequestType::Asset),
            "documents" => Some(RequestType::Documents),
            "vendor" => Some(RequestType::Vendor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Draft,
    Assigned,
    InProgress,
    OnHold,
    Completed,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Draft => "DRAFT",
            RequestStatus::Assigned => "ASSIGNED",
            RequestStatus::InProgress => "IN_PROGRESS",
            RequestStatus::OnHold => "ON_HOLD",
            RequestStatus::Completed => "COMPLETED",
            RequestStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<RequestStatus> {
        match s {
            "DRAFT" => Some(RequestStatus::Draft),
            "ASSIGNED" => Some(RequestStatus::Assigned),
            "IN_PROGRESS" => Some(RequestStatus::InProgress),
            "ON_HOLD" => Some(RequestStatus::OnHold),
            "COMPLETED" => Some(RequestStatus::Completed),
            "REJECTED" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Normal => "NORMAL",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }

    pub fn parse(s: &str) -> Option<Priority> {
        match s {
            "LOW" => Some(Priority::Low),
            "NORMAL" => Some(Priority::Normal),
            "HIGH" => Some(Priority::High),
            "URGENT" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub requester_id: Uuid,
    pub client_org_id: Uuid,
    pub subject_name: String,
    pub subject_phone: Option<String>,
    pub subject_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub loan_ref_no: Option<String>,
    pub status: RequestStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

/// Request intake payload. Required fields are optional here so their absence
/// surfaces as a validation error rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestPayload {
    #[serde(rename = "type")]
    pub request_type: Option<RequestType>,
    pub requester_id: Option<Uuid>,
    pub client_org_id: Option<Uuid>,
    pub subject_name: Option<String>,
    pub subject_phone: Option<String>,
    pub subject_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub loan_ref_no: Option<String>,
    pub priority: Option<Priority>,
}

/// Admin-only partial update of subject fields, status and priority.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestPayload {
    pub subject_name: Option<String>,
    pub subject_phone: Option<String>,
    pub subject_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub loan_ref_no: Option<String>,
    pub status: Option<RequestStatus>,
    pub priority: Option<Priority>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_type_is_lowercase_on_the_wire() {
        assert_eq!(serde_json::to_string(&RequestType::Loan).unwrap(), "\"loan\"");
        assert_eq!(RequestType::parse("vendor"), Some(RequestType::Vendor));
        assert_eq!(RequestType::parse("LOAN"), None);
    }

    #[test]
    fn status_wire_names_round_trip() {
        for status in [
            RequestStatus::Draft,
            RequestStatus::Assigned,
            RequestStatus::InProgress,
            RequestStatus::OnHold,
            RequestStatus::Completed,
            RequestStatus::Rejected,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
    }
}
