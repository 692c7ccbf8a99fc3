use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};

use crate::workflows::pipeline::domain::{
    Actor, ActorRole, DataLinkStatus, LocationRequestStatus, PoiCategory, PoiId, PointOfInterest,
    Project, ProjectId, Segment, SegmentId,
};
use crate::workflows::pipeline::edit_requests::domain::{
    ChangeSet, EditRequest, EditRequestDraft, EditTargetKind, FieldChange,
};
use crate::workflows::pipeline::edit_requests::service::EditRequestService;
use crate::workflows::pipeline::status::StatusEngine;
use crate::workflows::pipeline::store::{EntityStore, MemoryStore, NotifyError, ReviewNotifier};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date")
}

pub(super) fn engine() -> StatusEngine {
    StatusEngine::default()
}

pub(super) fn project(id: &str) -> Project {
    Project {
        project_id: ProjectId(id.to_string()),
        advertiser_name: "Northwind Foods".to_string(),
        agency_name: Some("Meridian Agency".to_string()),
        appeal_point: "Store visit lift".to_string(),
        universe_service_id: Some("SVC-2201".to_string()),
        universe_service_name: Some("UNIVERSE".to_string()),
        delivery_start_date: None,
        delivery_end_date: None,
        person_in_charge: "sato".to_string(),
        sub_person_in_charge: Some("tanaka".to_string()),
        remarks: None,
        registered_at: Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).single().expect("valid"),
    }
}

pub(super) fn segment(id: &str, project_id: &str) -> Segment {
    Segment {
        segment_id: SegmentId(id.to_string()),
        project_id: ProjectId(project_id.to_string()),
        segment_name: None,
        ads_account_id: Some("17890".to_string()),
        data_link_status: DataLinkStatus::BeforeRequest,
        location_request_status: LocationRequestStatus::NotRequested,
        data_link_request_date: None,
        segment_expire_date: None,
        registered_at: Utc.with_ymd_and_hms(2025, 5, 2, 9, 0, 0).single().expect("valid"),
    }
}

pub(super) fn poi(id: &str, project_id: &str, segment_id: &str) -> PointOfInterest {
    PointOfInterest {
        poi_id: PoiId(id.to_string()),
        project_id: ProjectId(project_id.to_string()),
        segment_id: Some(SegmentId(segment_id.to_string())),
        poi_name: "Flagship store".to_string(),
        address: Some("1-2-3 Chuo, Osaka".to_string()),
        latitude: Some(34.6937),
        longitude: Some(135.5023),
        category: PoiCategory::Tg,
    }
}

pub(super) fn admin() -> Actor {
    Actor {
        user_id: "admin@example.com".to_string(),
        name: "admin".to_string(),
        role: ActorRole::Admin,
    }
}

pub(super) fn sales(name: &str) -> Actor {
    Actor {
        user_id: format!("{name}@example.com"),
        name: name.to_string(),
        role: ActorRole::Sales,
    }
}

pub(super) fn change(field: &str, before: Value, after: Value) -> ChangeSet {
    let mut changes = ChangeSet::new();
    changes.insert(field.to_string(), FieldChange { before, after });
    changes
}

pub(super) fn draft_for_project(project_id: &str, changes: ChangeSet) -> EditRequestDraft {
    EditRequestDraft {
        request_type: EditTargetKind::Project,
        target_id: project_id.to_string(),
        project_id: ProjectId(project_id.to_string()),
        requested_by: "sato@example.com".to_string(),
        request_reason: "advertiser entity was renamed".to_string(),
        changes,
    }
}

pub(super) fn draft_for_segment(
    project_id: &str,
    segment_id: &str,
    changes: ChangeSet,
) -> EditRequestDraft {
    EditRequestDraft {
        request_type: EditTargetKind::Segment,
        target_id: segment_id.to_string(),
        project_id: ProjectId(project_id.to_string()),
        requested_by: "sato@example.com".to_string(),
        request_reason: "segment settings need correcting".to_string(),
        changes,
    }
}

/// Store seeded with one project, one segment, and one POI.
pub(super) fn seeded_store() -> MemoryStore {
    let store = MemoryStore::default();
    store
        .insert_project(project("PRJ-1"))
        .expect("seed project");
    store
        .insert_segment(segment("SEG-1", "PRJ-1"))
        .expect("seed segment");
    store
        .insert_poi(poi("POI-1", "PRJ-1", "SEG-1"))
        .expect("seed poi");
    store
}

#[derive(Default, Clone)]
pub(super) struct RecordingNotifier {
    events: Arc<Mutex<Vec<EditRequest>>>,
}

impl RecordingNotifier {
    pub(super) fn events(&self) -> Vec<EditRequest> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl ReviewNotifier for RecordingNotifier {
    fn request_created(&self, request: &EditRequest) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(request.clone());
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl ReviewNotifier for FailingNotifier {
    fn request_created(&self, _request: &EditRequest) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp offline".to_string()))
    }
}

pub(super) fn build_service() -> (
    EditRequestService<MemoryStore, RecordingNotifier>,
    MemoryStore,
    Arc<RecordingNotifier>,
) {
    let store = seeded_store();
    let notifier = Arc::new(RecordingNotifier::default());
    let service = EditRequestService::new(Arc::new(store.clone()), notifier.clone());
    (service, store, notifier)
}

pub(super) fn rename_changes() -> ChangeSet {
    change(
        "advertiser_name",
        json!("Northwind Foods"),
        json!("Northwind Holdings"),
    )
}
