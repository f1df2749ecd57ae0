use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "ASSIGNED",
            AssignmentStatus::InProgress => "IN_PROGRESS",
            AssignmentStatus::Completed => "COMPLETED",
            AssignmentStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<AssignmentStatus> {
        match s {
            "ASSIGNED" => Some(AssignmentStatus::Assigned),
            "IN_PROGRESS" => Some(AssignmentStatus::InProgress),
            "COMPLETED" => Some(AssignmentStatus::Completed),
            "CANCELLED" => Some(AssignmentStatus::Cancelled),
            _ => None,
        }
    }

    /// Legal edges of the assignment state machine:
    /// ASSIGNED -> IN_PROGRESS -> COMPLETED, with CANCELLED reachable from
    /// ASSIGNED and IN_PROGRESS. COMPLETED and CANCELLED are terminal.
    pub fn can_transition(self, next: AssignmentStatus) -> bool {
        use AssignmentStatus::*;
        matches!(
            (self, next),
            (Assigned, InProgress) | (Assigned, Cancelled) | (InProgress, Completed) | (InProgress, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    pub request_id: Uuid,
    pub agent_id: Uuid,
    pub status: AssignmentStatus,
    pub assigned_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentPayload {
    pub request_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentStatusPayload {
    pub status: AssignmentStatus,
}

#[cfg(test)]
mod tests {
    use super::AssignmentStatus::*;

    #[test]
    fn state_machine_edges() {
        assert!(Assigned.can_transition(InProgress));
        assert!(Assigned.can_transition(Cancelled));
        assert!(InProgress.can_transition(Completed));
        assert!(InProgress.can_transition(Cancelled));

        // Skipping IN_PROGRESS is not allowed.
        assert!(!Assigned.can_transition(Completed));
        // Terminal states stay terminal.
        assert!(!Completed.can_transition(InProgress));
        assert!(!Cancelled.can_transition(Assigned));
        // Re-submitting the current status is not a transition.
        assert!(!InProgress.can_transition(InProgress));
    }
}
