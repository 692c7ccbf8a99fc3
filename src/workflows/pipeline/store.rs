//! Storage and notification seams so the workflow can be exercised in
//! isolation and re-pointed at a real backend later.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{PoiId, PointOfInterest, Project, ProjectId, Segment, SegmentId};
use super::edit_requests::domain::{ChangeHistory, EditRequest, EditRequestStatus, RequestId};

/// Error enumeration for entity store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction over projects, segments, POIs, edit requests, and the
/// change log.
///
/// Implementations must provide read-your-writes: a successful update is
/// visible to any subsequent read through the same handle.
pub trait EntityStore: Send + Sync {
    fn projects(&self) -> Result<Vec<Project>, StoreError>;
    fn segments(&self) -> Result<Vec<Segment>, StoreError>;
    fn pois(&self) -> Result<Vec<PointOfInterest>, StoreError>;

    fn project(&self, id: &ProjectId) -> Result<Option<Project>, StoreError>;
    fn segment(&self, id: &SegmentId) -> Result<Option<Segment>, StoreError>;
    fn poi(&self, id: &PoiId) -> Result<Option<PointOfInterest>, StoreError>;

    fn insert_project(&self, project: Project) -> Result<Project, StoreError>;
    fn insert_segment(&self, segment: Segment) -> Result<Segment, StoreError>;
    fn insert_poi(&self, poi: PointOfInterest) -> Result<PointOfInterest, StoreError>;

    fn update_project(&self, project: Project) -> Result<Project, StoreError>;
    fn update_segment(&self, segment: Segment) -> Result<Segment, StoreError>;
    fn update_poi(&self, poi: PointOfInterest) -> Result<PointOfInterest, StoreError>;

    /// Delete a project together with its segments and their POIs.
    fn delete_project(&self, id: &ProjectId) -> Result<(), StoreError>;
    /// Delete a segment together with its POIs.
    fn delete_segment(&self, id: &SegmentId) -> Result<(), StoreError>;
    fn delete_poi(&self, id: &PoiId) -> Result<(), StoreError>;

    fn insert_request(&self, request: EditRequest) -> Result<EditRequest, StoreError>;
    fn request(&self, id: &RequestId) -> Result<Option<EditRequest>, StoreError>;
    fn requests(&self) -> Result<Vec<EditRequest>, StoreError>;

    /// Replace a stored request only while its status is still `Pending`;
    /// otherwise fail with `Conflict`. This compare-and-swap is what
    /// serializes concurrent resolutions of the same request.
    fn resolve_if_pending(&self, request: EditRequest) -> Result<EditRequest, StoreError>;

    fn append_history(&self, entry: ChangeHistory) -> Result<(), StoreError>;
    fn history_for(&self, project_id: &ProjectId) -> Result<Vec<ChangeHistory>, StoreError>;
}

/// Notification error for the reviewer hook.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Outbound hook telling reviewers a new request is waiting.
///
/// Fire-and-forget: the workflow logs failures and never propagates them.
pub trait ReviewNotifier: Send + Sync {
    fn request_created(&self, request: &EditRequest) -> Result<(), NotifyError>;
}

/// Notifier that only writes a log line; the default wiring for the demo
/// binary.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl ReviewNotifier for LogNotifier {
    fn request_created(&self, request: &EditRequest) -> Result<(), NotifyError> {
        tracing::info!(
            request_id = %request.request_id.0,
            kind = request.request_type.label(),
            target = %request.target_id,
            "edit request submitted for review"
        );
        Ok(())
    }
}

#[derive(Default)]
struct MemoryTables {
    projects: HashMap<ProjectId, Project>,
    segments: HashMap<SegmentId, Segment>,
    pois: HashMap<PoiId, PointOfInterest>,
    requests: HashMap<RequestId, EditRequest>,
    history: Vec<ChangeHistory>,
}

/// Mutex-guarded in-memory store backing the demo binary and the test suite.
///
/// A single lock covers every table, which also delivers the `resolve_if_pending`
/// compare-and-swap atomically.
#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<MemoryTables>>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, MemoryTables> {
        self.tables.lock().expect("store mutex poisoned")
    }
}

impl EntityStore for MemoryStore {
    fn projects(&self) -> Result<Vec<Project>, StoreError> {
        let guard = self.lock();
        let mut items: Vec<Project> = guard.projects.values().cloned().collect();
        items.sort_by(|a, b| a.project_id.0.cmp(&b.project_id.0));
        Ok(items)
    }

    fn segments(&self) -> Result<Vec<Segment>, StoreError> {
        let guard = self.lock();
        let mut items: Vec<Segment> = guard.segments.values().cloned().collect();
        items.sort_by(|a, b| a.segment_id.0.cmp(&b.segment_id.0));
        Ok(items)
    }

    fn pois(&self) -> Result<Vec<PointOfInterest>, StoreError> {
        let guard = self.lock();
        let mut items: Vec<PointOfInterest> = guard.pois.values().cloned().collect();
        items.sort_by(|a, b| a.poi_id.0.cmp(&b.poi_id.0));
        Ok(items)
    }

    fn project(&self, id: &ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.lock().projects.get(id).cloned())
    }

    fn segment(&self, id: &SegmentId) -> Result<Option<Segment>, StoreError> {
        Ok(self.lock().segments.get(id).cloned())
    }

    fn poi(&self, id: &PoiId) -> Result<Option<PointOfInterest>, StoreError> {
        Ok(self.lock().pois.get(id).cloned())
    }

    fn insert_project(&self, project: Project) -> Result<Project, StoreError> {
        let mut guard = self.lock();
        if guard.projects.contains_key(&project.project_id) {
            return Err(StoreError::Conflict);
        }
        guard
            .projects
            .insert(project.project_id.clone(), project.clone());
        Ok(project)
    }

    fn insert_segment(&self, segment: Segment) -> Result<Segment, StoreError> {
        let mut guard = self.lock();
        if guard.segments.contains_key(&segment.segment_id) {
            return Err(StoreError::Conflict);
        }
        guard
            .segments
            .insert(segment.segment_id.clone(), segment.clone());
        Ok(segment)
    }

    fn insert_poi(&self, poi: PointOfInterest) -> Result<PointOfInterest, StoreError> {
        let mut guard = self.lock();
        if guard.pois.contains_key(&poi.poi_id) {
            return Err(StoreError::Conflict);
        }
        guard.pois.insert(poi.poi_id.clone(), poi.clone());
        Ok(poi)
    }

    fn update_project(&self, project: Project) -> Result<Project, StoreError> {
        let mut guard = self.lock();
        if !guard.projects.contains_key(&project.project_id) {
            return Err(StoreError::NotFound);
        }
        guard
            .projects
            .insert(project.project_id.clone(), project.clone());
        Ok(project)
    }

    fn update_segment(&self, segment: Segment) -> Result<Segment, StoreError> {
        let mut guard = self.lock();
        if !guard.segments.contains_key(&segment.segment_id) {
            return Err(StoreError::NotFound);
        }
        guard
            .segments
            .insert(segment.segment_id.clone(), segment.clone());
        Ok(segment)
    }

    fn update_poi(&self, poi: PointOfInterest) -> Result<PointOfInterest, StoreError> {
        let mut guard = self.lock();
        if !guard.pois.contains_key(&poi.poi_id) {
            return Err(StoreError::NotFound);
        }
        guard.pois.insert(poi.poi_id.clone(), poi.clone());
        Ok(poi)
    }

    fn delete_project(&self, id: &ProjectId) -> Result<(), StoreError> {
        let mut guard = self.lock();
        if guard.projects.remove(id).is_none() {
            return Err(StoreError::NotFound);
        }
        let orphaned: Vec<SegmentId> = guard
            .segments
            .values()
            .filter(|segment| segment.project_id == *id)
            .map(|segment| segment.segment_id.clone())
            .collect();
        for segment_id in &orphaned {
            guard.segments.remove(segment_id);
        }
        guard.pois.retain(|_, poi| {
            poi.segment_id
                .as_ref()
                .map(|segment_id| !orphaned.contains(segment_id))
                .unwrap_or(poi.project_id != *id)
        });
        Ok(())
    }

    fn delete_segment(&self, id: &SegmentId) -> Result<(), StoreError> {
        let mut guard = self.lock();
        if guard.segments.remove(id).is_none() {
            return Err(StoreError::NotFound);
        }
        guard
            .pois
            .retain(|_, poi| poi.segment_id.as_ref() != Some(id));
        Ok(())
    }

    fn delete_poi(&self, id: &PoiId) -> Result<(), StoreError> {
        let mut guard = self.lock();
        if guard.pois.remove(id).is_none() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn insert_request(&self, request: EditRequest) -> Result<EditRequest, StoreError> {
        let mut guard = self.lock();
        if guard.requests.contains_key(&request.request_id) {
            return Err(StoreError::Conflict);
        }
        guard
            .requests
            .insert(request.request_id.clone(), request.clone());
        Ok(request)
    }

    fn request(&self, id: &RequestId) -> Result<Option<EditRequest>, StoreError> {
        Ok(self.lock().requests.get(id).cloned())
    }

    fn requests(&self) -> Result<Vec<EditRequest>, StoreError> {
        let guard = self.lock();
        let mut items: Vec<EditRequest> = guard.requests.values().cloned().collect();
        items.sort_by(|a, b| a.request_id.0.cmp(&b.request_id.0));
        Ok(items)
    }

    fn resolve_if_pending(&self, request: EditRequest) -> Result<EditRequest, StoreError> {
        let mut guard = self.lock();
        match guard.requests.get(&request.request_id) {
            None => Err(StoreError::NotFound),
            Some(stored) if stored.status != EditRequestStatus::Pending => {
                Err(StoreError::Conflict)
            }
            Some(_) => {
                guard
                    .requests
                    .insert(request.request_id.clone(), request.clone());
                Ok(request)
            }
        }
    }

    fn append_history(&self, entry: ChangeHistory) -> Result<(), StoreError> {
        self.lock().history.push(entry);
        Ok(())
    }

    fn history_for(&self, project_id: &ProjectId) -> Result<Vec<ChangeHistory>, StoreError> {
        Ok(self
            .lock()
            .history
            .iter()
            .filter(|entry| entry.project_id == *project_id)
            .cloned()
            .collect())
    }
}
