use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceKind {
    Photo,
    Video,
    Document,
    Signature,
    Other,
}

impl EvidenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::Photo => "PHOTO",
            EvidenceKind::Video => "VIDEO",
            EvidenceKind::Document => "DOCUMENT",
            EvidenceKind::Signature => "SIGNATURE",
            EvidenceKind::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Option<EvidenceKind> {
        match s {
            "PHOTO" => Some(EvidenceKind::Photo),
            "VIDEO" => Some(EvidenceKind::Video),
            "DOCUMENT" => Some(EvidenceKind::Document),
            "SIGNATURE" => Some(EvidenceKind::Signature),
            "OTHER" => Some(EvidenceKind::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub id: Uuid,
    pub request_id: Uuid,
    pub uploader_id: Uuid,
    pub kind: EvidenceKind,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub storage_key: String,
    pub gps_lat: Option<f64>,
    pub gps_lng: Option<f64>,
    pub shot_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
