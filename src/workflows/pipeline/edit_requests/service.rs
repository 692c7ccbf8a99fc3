use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::domain::{
    ChangeHistory, EditRequest, EditRequestDraft, EditRequestStatus, EditTargetKind,
    HistoryAction, RequestId,
};
use super::fields::{self, FieldError};
use crate::workflows::pipeline::domain::{PoiId, ProjectId, SegmentId};
use crate::workflows::pipeline::store::{EntityStore, ReviewNotifier, StoreError};

/// Error raised by the edit request workflow.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("invalid edit request: {0}")]
    Validation(String),
    #[error("edit request {0} not found")]
    NotFound(String),
    #[error("edit request {request_id} is already {status}")]
    InvalidState {
        request_id: String,
        status: &'static str,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FieldError> for WorkflowError {
    fn from(value: FieldError) -> Self {
        Self::Validation(value.to_string())
    }
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static HISTORY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

const MIN_REASON_CHARS: usize = 10;

fn next_request_id(now: DateTime<Utc>) -> RequestId {
    let seq = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("REQ_{}_{seq:05}", now.format("%Y%m%d")))
}

fn next_history_id(now: DateTime<Utc>) -> String {
    let seq = HISTORY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("HIS_{}_{seq:05}", now.format("%Y%m%d"))
}

/// Orchestrates the proposal/approval lifecycle for field-level edits.
///
/// The only component in the pipeline core with side effects: it writes
/// through the entity store and pings the reviewer notification hook.
pub struct EditRequestService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<S, N> EditRequestService<S, N>
where
    S: EntityStore + 'static,
    N: ReviewNotifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Submit a proposal. The reviewer notification is fire-and-forget: a
    /// notifier failure is logged and never fails the create.
    pub fn create(&self, draft: EditRequestDraft) -> Result<EditRequest, WorkflowError> {
        if draft.changes.is_empty() {
            return Err(WorkflowError::Validation(
                "changes must not be empty".to_string(),
            ));
        }
        if draft.target_id.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "target id must be set".to_string(),
            ));
        }
        if draft.request_reason.trim().chars().count() < MIN_REASON_CHARS {
            return Err(WorkflowError::Validation(format!(
                "request reason must be at least {MIN_REASON_CHARS} characters"
            )));
        }

        let now = Utc::now();
        let request = EditRequest {
            request_id: next_request_id(now),
            request_type: draft.request_type,
            target_id: draft.target_id,
            project_id: draft.project_id,
            requested_by: draft.requested_by,
            requested_at: now,
            request_reason: draft.request_reason,
            status: EditRequestStatus::Pending,
            changes: draft.changes,
            reviewed_by: None,
            reviewed_at: None,
            review_comment: None,
        };

        let stored = self.store.insert_request(request)?;

        if let Err(err) = self.notifier.request_created(&stored) {
            warn!(
                request_id = %stored.request_id.0,
                error = %err,
                "reviewer notification failed"
            );
        }

        Ok(stored)
    }

    /// Apply a pending request's diff to its target entity, then mark the
    /// request approved.
    ///
    /// The entity write happens first, so a store failure leaves the request
    /// pending; the resolution itself is a compare-and-swap, so no two
    /// concurrent approvals of the same request can both succeed.
    pub fn approve(
        &self,
        request_id: &RequestId,
        reviewer_id: &str,
        comment: Option<String>,
    ) -> Result<EditRequest, WorkflowError> {
        let request = self.fetch_pending(request_id)?;

        self.apply_changes(&request)?;

        let now = Utc::now();
        let mut resolved = request;
        resolved.status = EditRequestStatus::Approved;
        resolved.reviewed_by = Some(reviewer_id.to_string());
        resolved.reviewed_at = Some(now);
        resolved.review_comment = comment;

        let resolved = self.finish(resolved)?;

        let entry = ChangeHistory {
            history_id: next_history_id(now),
            entity_type: resolved.request_type,
            entity_id: resolved.target_id.clone(),
            project_id: resolved.project_id.clone(),
            action: HistoryAction::Update,
            changed_by: reviewer_id.to_string(),
            changed_at: now,
            changes: Some(resolved.changes.clone()),
        };
        if let Err(err) = self.store.append_history(entry) {
            warn!(
                request_id = %resolved.request_id.0,
                error = %err,
                "change history append failed"
            );
        }

        Ok(resolved)
    }

    /// Decline a pending request without touching the target entity. The
    /// rejection comment is mandatory.
    pub fn reject(
        &self,
        request_id: &RequestId,
        reviewer_id: &str,
        comment: &str,
    ) -> Result<EditRequest, WorkflowError> {
        if comment.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "a rejection comment is required".to_string(),
            ));
        }

        let mut resolved = self.fetch_pending(request_id)?;
        resolved.status = EditRequestStatus::Rejected;
        resolved.reviewed_by = Some(reviewer_id.to_string());
        resolved.reviewed_at = Some(Utc::now());
        resolved.review_comment = Some(comment.to_string());
        self.finish(resolved)
    }

    /// Cancel a pending request on behalf of its author. No reviewer
    /// metadata, no entity mutation.
    pub fn withdraw(&self, request_id: &RequestId) -> Result<EditRequest, WorkflowError> {
        let mut resolved = self.fetch_pending(request_id)?;
        resolved.status = EditRequestStatus::Withdrawn;
        self.finish(resolved)
    }

    pub fn get(&self, request_id: &RequestId) -> Result<EditRequest, WorkflowError> {
        self.store
            .request(request_id)?
            .ok_or_else(|| WorkflowError::NotFound(request_id.0.clone()))
    }

    /// Requests still awaiting review, oldest first.
    pub fn pending(&self) -> Result<Vec<EditRequest>, WorkflowError> {
        let mut requests: Vec<EditRequest> = self
            .store
            .requests()?
            .into_iter()
            .filter(|request| request.status == EditRequestStatus::Pending)
            .collect();
        requests.sort_by(|a, b| a.requested_at.cmp(&b.requested_at));
        Ok(requests)
    }

    fn fetch_pending(&self, request_id: &RequestId) -> Result<EditRequest, WorkflowError> {
        let request = self.get(request_id)?;
        if request.status != EditRequestStatus::Pending {
            return Err(WorkflowError::InvalidState {
                request_id: request_id.0.clone(),
                status: request.status.label(),
            });
        }
        Ok(request)
    }

    /// Dispatch the diff to the typed update path for the targeted entity.
    /// Unknown fields and mis-shaped values fail validation before any write.
    fn apply_changes(&self, request: &EditRequest) -> Result<(), WorkflowError> {
        match request.request_type {
            EditTargetKind::Project => {
                let id = ProjectId(request.target_id.clone());
                let mut project = self.store.project(&id)?.ok_or(StoreError::NotFound)?;
                for (field, change) in &request.changes {
                    fields::apply_project_field(&mut project, field, &change.after)?;
                }
                self.store.update_project(project)?;
            }
            EditTargetKind::Segment => {
                let id = SegmentId(request.target_id.clone());
                let mut segment = self.store.segment(&id)?.ok_or(StoreError::NotFound)?;
                for (field, change) in &request.changes {
                    fields::apply_segment_field(&mut segment, field, &change.after)?;
                }
                self.store.update_segment(segment)?;
            }
            EditTargetKind::Poi => {
                let id = PoiId(request.target_id.clone());
                let mut poi = self.store.poi(&id)?.ok_or(StoreError::NotFound)?;
                for (field, change) in &request.changes {
                    fields::apply_poi_field(&mut poi, field, &change.after)?;
                }
                self.store.update_poi(poi)?;
            }
        }
        Ok(())
    }

    /// Run the compare-and-swap resolution. Losing the race to another
    /// reviewer surfaces as `InvalidState` with the winner's status.
    fn finish(&self, resolved: EditRequest) -> Result<EditRequest, WorkflowError> {
        let request_id = resolved.request_id.clone();
        match self.store.resolve_if_pending(resolved) {
            Ok(stored) => Ok(stored),
            Err(StoreError::Conflict) => {
                let status = self
                    .store
                    .request(&request_id)?
                    .map(|current| current.status.label())
                    .unwrap_or("resolved");
                Err(WorkflowError::InvalidState {
                    request_id: request_id.0,
                    status,
                })
            }
            Err(other) => Err(other.into()),
        }
    }
}
