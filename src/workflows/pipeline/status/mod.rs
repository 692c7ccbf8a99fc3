mod config;
mod policy;
mod rules;

pub use config::StatusConfig;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{PointOfInterest, Project, Segment};

/// Derived pipeline stage of a project. Never persisted; recomputed on every
/// read from the project's segments and POIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Draft,
    WaitingPoi,
    WaitingAccountId,
    WaitingServiceId,
    InProgress,
    LinkRequested,
    Linked,
    ExpiringSoon,
}

impl PipelineStatus {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Draft,
            Self::WaitingPoi,
            Self::WaitingAccountId,
            Self::WaitingServiceId,
            Self::InProgress,
            Self::LinkRequested,
            Self::Linked,
            Self::ExpiringSoon,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::WaitingPoi => "Waiting for POI registration",
            Self::WaitingAccountId => "Waiting for ads account id",
            Self::WaitingServiceId => "Waiting for service id",
            Self::InProgress => "In progress",
            Self::LinkRequested => "Link requested",
            Self::Linked => "Linked",
            Self::ExpiringSoon => "Expiring soon",
        }
    }

    /// Bucket used by list views. The three input-collection stages collapse
    /// into `WaitingInput`; derivation itself never produces the aggregate.
    pub const fn display_group(self) -> DisplayGroup {
        match self {
            Self::Draft => DisplayGroup::Draft,
            Self::WaitingPoi | Self::WaitingAccountId | Self::WaitingServiceId => {
                DisplayGroup::WaitingInput
            }
            Self::InProgress => DisplayGroup::InProgress,
            Self::LinkRequested => DisplayGroup::LinkRequested,
            Self::Linked => DisplayGroup::Linked,
            Self::ExpiringSoon => DisplayGroup::ExpiringSoon,
        }
    }
}

/// Coarse display grouping for dashboards and list filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayGroup {
    Draft,
    WaitingInput,
    InProgress,
    LinkRequested,
    Linked,
    ExpiringSoon,
}

impl DisplayGroup {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::WaitingInput => "Waiting for input",
            Self::InProgress => "In progress",
            Self::LinkRequested => "Link requested",
            Self::Linked => "Linked",
            Self::ExpiringSoon => "Expiring soon",
        }
    }
}

/// Snapshot describing a project's derived stage and the counters behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStatusInfo {
    pub status: PipelineStatus,
    pub label: &'static str,
    pub reason: String,
    pub segment_count: usize,
    pub poi_count: usize,
    pub linked_segment_count: usize,
    pub has_all_account_ids: bool,
}

/// Stateless derivation engine configured with pipeline thresholds.
#[derive(Debug, Clone, Default)]
pub struct StatusEngine {
    config: StatusConfig,
}

impl StatusEngine {
    pub fn new(config: StatusConfig) -> Self {
        Self { config }
    }

    /// Derive the pipeline stage for one project.
    ///
    /// Total: malformed input degrades to `Draft` with a descriptive reason
    /// instead of failing, so one corrupt record never breaks a list render.
    /// The evaluation date is an explicit parameter to keep the derivation
    /// deterministic.
    pub fn derive(
        &self,
        project: &Project,
        all_segments: &[Segment],
        all_pois: &[PointOfInterest],
        today: NaiveDate,
    ) -> ProjectStatusInfo {
        if project.project_id.0.trim().is_empty() {
            return ProjectStatusInfo {
                status: PipelineStatus::Draft,
                label: PipelineStatus::Draft.label(),
                reason: "project id is not set".to_string(),
                segment_count: 0,
                poi_count: 0,
                linked_segment_count: 0,
                has_all_account_ids: false,
            };
        }

        let signals = rules::compute_signals(project, all_segments, all_pois, today, &self.config);
        let (status, reason) = policy::resolve(&signals);

        ProjectStatusInfo {
            status,
            label: status.label(),
            reason,
            segment_count: signals.segment_count,
            poi_count: signals.poi_count,
            linked_segment_count: signals.linked_segment_count,
            has_all_account_ids: signals.has_all_account_ids,
        }
    }

    /// Tally derived stages across a project list. `total` always equals the
    /// input length; derivation is total, so every project lands in a bucket.
    pub fn count_by_status(
        &self,
        projects: &[Project],
        all_segments: &[Segment],
        all_pois: &[PointOfInterest],
        today: NaiveDate,
    ) -> StatusCounts {
        let mut counts = StatusCounts {
            total: projects.len(),
            ..StatusCounts::default()
        };
        for project in projects {
            let info = self.derive(project, all_segments, all_pois, today);
            counts.bump(info.status);
        }
        counts
    }
}

/// Per-status tallies for dashboard rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub draft: usize,
    pub waiting_poi: usize,
    pub waiting_account_id: usize,
    pub waiting_service_id: usize,
    pub in_progress: usize,
    pub link_requested: usize,
    pub linked: usize,
    pub expiring_soon: usize,
    pub total: usize,
}

impl StatusCounts {
    fn bump(&mut self, status: PipelineStatus) {
        match status {
            PipelineStatus::Draft => self.draft += 1,
            PipelineStatus::WaitingPoi => self.waiting_poi += 1,
            PipelineStatus::WaitingAccountId => self.waiting_account_id += 1,
            PipelineStatus::WaitingServiceId => self.waiting_service_id += 1,
            PipelineStatus::InProgress => self.in_progress += 1,
            PipelineStatus::LinkRequested => self.link_requested += 1,
            PipelineStatus::Linked => self.linked += 1,
            PipelineStatus::ExpiringSoon => self.expiring_soon += 1,
        }
    }

    /// Sum of the three input-collection buckets (display-only aggregate).
    pub fn waiting_input(&self) -> usize {
        self.waiting_poi + self.waiting_account_id + self.waiting_service_id
    }

    /// Sum of every specific bucket, excluding `total`.
    pub fn resolved(&self) -> usize {
        self.draft
            + self.waiting_poi
            + self.waiting_account_id
            + self.waiting_service_id
            + self.in_progress
            + self.link_requested
            + self.linked
            + self.expiring_soon
    }
}
