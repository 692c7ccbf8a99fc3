use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for advertising projects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

/// Identifier wrapper for data-linkage segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub String);

/// Identifier wrapper for points of interest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoiId(pub String);

/// Top-level advertising engagement record.
///
/// The pipeline stage is never stored on this struct; it is derived per read
/// by the status engine from the project's segments and POIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: ProjectId,
    pub advertiser_name: String,
    pub agency_name: Option<String>,
    pub appeal_point: String,
    pub universe_service_id: Option<String>,
    pub universe_service_name: Option<String>,
    pub delivery_start_date: Option<NaiveDate>,
    pub delivery_end_date: Option<NaiveDate>,
    pub person_in_charge: String,
    pub sub_person_in_charge: Option<String>,
    pub remarks: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl Project {
    /// Whether `name` is the project's primary or secondary assignee.
    pub fn is_assigned_to(&self, name: &str) -> bool {
        self.person_in_charge == name || self.sub_person_in_charge.as_deref() == Some(name)
    }
}

/// Hand-off progress between sales and the data-linkage desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLinkStatus {
    BeforeRequest,
    NotRequested,
    Requested,
    Linked,
    Error,
}

impl DataLinkStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::BeforeRequest => "before link request",
            Self::NotRequested => "not requested",
            Self::Requested => "link requested",
            Self::Linked => "linked",
            Self::Error => "link error",
        }
    }
}

/// Back-office progress on storing a segment's POI batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationRequestStatus {
    NotRequested,
    Storing,
    Completed,
}

impl LocationRequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotRequested => "not requested",
            Self::Storing => "storing",
            Self::Completed => "completed",
        }
    }
}

/// A data-linkage unit belonging to exactly one project, tracked toward an
/// external distribution partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub segment_id: SegmentId,
    pub project_id: ProjectId,
    pub segment_name: Option<String>,
    pub ads_account_id: Option<String>,
    pub data_link_status: DataLinkStatus,
    pub location_request_status: LocationRequestStatus,
    pub data_link_request_date: Option<NaiveDate>,
    pub segment_expire_date: Option<NaiveDate>,
    pub registered_at: DateTime<Utc>,
}

/// Whether a POI targets a segment or measures store visits on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiCategory {
    Tg,
    VisitMeasurement,
}

/// Geographic targeting record attached to a segment, or standalone when it
/// only measures visits (`segment_id` is then `None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub poi_id: PoiId,
    pub project_id: ProjectId,
    pub segment_id: Option<SegmentId>,
    pub poi_name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: PoiCategory,
}

/// Privilege tier of a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Admin,
    Sales,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Sales => "sales",
        }
    }
}

/// Caller identity evaluated by the visibility policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub name: String,
    pub role: ActorRole,
}
