//! Proposal/approval workflow for field-level edits to locked entities.

pub mod domain;
pub mod fields;
pub mod service;

pub use domain::{
    ChangeHistory, ChangeSet, EditRequest, EditRequestDraft, EditRequestStatus, EditTargetKind,
    FieldChange, HistoryAction, RequestId,
};
pub use fields::{
    can_direct_edit, change_diff, conflicts_with_pending, is_approval_required_field,
    is_direct_edit_field, requires_edit_request, EditTarget, FieldError,
    PROJECT_APPROVAL_REQUIRED_FIELDS, PROJECT_DIRECT_EDIT_FIELDS,
};
pub use service::{EditRequestService, WorkflowError};
