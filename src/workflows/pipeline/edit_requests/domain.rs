use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflows::pipeline::domain::ProjectId;

/// Identifier wrapper for edit requests (`REQ_YYYYMMDD_NNNNN`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

/// Entity family an edit request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditTargetKind {
    Project,
    Segment,
    Poi,
}

impl EditTargetKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Segment => "segment",
            Self::Poi => "poi",
        }
    }
}

/// Proposed before/after pair for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: Value,
    pub after: Value,
}

/// Field-keyed diff carried by an edit request.
pub type ChangeSet = BTreeMap<String, FieldChange>;

/// Lifecycle of an edit request. `Pending` is the only non-terminal state;
/// every transition out of it is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditRequestStatus {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
}

impl EditRequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A proposed field-level change awaiting review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRequest {
    pub request_id: RequestId,
    pub request_type: EditTargetKind,
    pub target_id: String,
    pub project_id: ProjectId,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub request_reason: String,
    pub status: EditRequestStatus,
    pub changes: ChangeSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_comment: Option<String>,
}

/// Caller-supplied payload for creating an edit request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRequestDraft {
    pub request_type: EditTargetKind,
    pub target_id: String,
    pub project_id: ProjectId,
    pub requested_by: String,
    pub request_reason: String,
    pub changes: ChangeSet,
}

/// Operation recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
}

/// Audit trail entry appended when an approved diff lands on an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeHistory {
    pub history_id: String,
    pub entity_type: EditTargetKind,
    pub entity_id: String,
    pub project_id: ProjectId,
    pub action: HistoryAction,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<ChangeSet>,
}
