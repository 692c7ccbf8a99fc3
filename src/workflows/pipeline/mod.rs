//! Advertising project pipeline core: derived status, the edit approval
//! workflow, and per-actor project visibility.
//!
//! The stage of a project is never stored. It is recomputed on every read
//! from the project's segments and POIs, so a mutation applied through the
//! edit request workflow is reflected by the very next derivation with no
//! cache invalidation step.

pub mod domain;
pub mod edit_requests;
pub mod report;
pub mod router;
pub mod status;
pub mod store;
pub mod visibility;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, ActorRole, DataLinkStatus, LocationRequestStatus, PoiCategory, PoiId, PointOfInterest,
    Project, ProjectId, Segment, SegmentId,
};
pub use edit_requests::{
    ChangeHistory, ChangeSet, EditRequest, EditRequestDraft, EditRequestService,
    EditRequestStatus, EditTargetKind, FieldChange, RequestId, WorkflowError,
};
pub use report::{status_board, visible_projects, ProjectOverview};
pub use router::pipeline_router;
pub use status::{
    DisplayGroup, PipelineStatus, ProjectStatusInfo, StatusConfig, StatusCounts, StatusEngine,
};
pub use store::{
    EntityStore, LogNotifier, MemoryStore, NotifyError, ReviewNotifier, StoreError,
};
pub use visibility::{can_edit_project, can_view_project};
