//! Field-level rules for the approval workflow: which project fields bypass
//! review, when the approval path becomes mandatory, and how an approved diff
//! lands on a typed entity without silent coercion.

use chrono::NaiveDate;
use serde_json::Value;

use super::domain::{ChangeSet, EditRequest, EditRequestDraft, EditRequestStatus, FieldChange};
use crate::workflows::pipeline::domain::{
    LocationRequestStatus, PointOfInterest, Project, Segment,
};

/// Project fields sales may change without review.
pub const PROJECT_DIRECT_EDIT_FIELDS: &[&str] = &[
    "universe_service_id",
    "universe_service_name",
    "remarks",
];

/// Project fields whose changes must go through an edit request.
pub const PROJECT_APPROVAL_REQUIRED_FIELDS: &[&str] = &[
    "advertiser_name",
    "agency_name",
    "appeal_point",
    "person_in_charge",
    "sub_person_in_charge",
];

pub fn is_direct_edit_field(field: &str) -> bool {
    PROJECT_DIRECT_EDIT_FIELDS.contains(&field)
}

pub fn is_approval_required_field(field: &str) -> bool {
    PROJECT_APPROVAL_REQUIRED_FIELDS.contains(&field)
}

/// Entity reference used to decide between a direct edit and the approval
/// path.
#[derive(Debug, Clone, Copy)]
pub enum EditTarget<'a> {
    Project {
        project: &'a Project,
        all_segments: &'a [Segment],
    },
    Segment(&'a Segment),
    Poi {
        parent_segment: Option<&'a Segment>,
    },
}

/// A project locks once any segment exists under it; segments and POIs lock
/// once the POI batch has been handed to the back office.
pub fn requires_edit_request(target: &EditTarget<'_>) -> bool {
    match target {
        EditTarget::Project {
            project,
            all_segments,
        } => all_segments
            .iter()
            .any(|segment| segment.project_id == project.project_id),
        EditTarget::Segment(segment) => segment_is_locked(segment),
        EditTarget::Poi { parent_segment } => {
            parent_segment.map(segment_is_locked).unwrap_or(false)
        }
    }
}

pub fn can_direct_edit(target: &EditTarget<'_>) -> bool {
    !requires_edit_request(target)
}

fn segment_is_locked(segment: &Segment) -> bool {
    matches!(
        segment.location_request_status,
        LocationRequestStatus::Storing | LocationRequestStatus::Completed
    )
}

/// Build the field diff between two serialized snapshots, keeping only the
/// fields whose values differ.
pub fn change_diff(before: &Value, after: &Value) -> ChangeSet {
    let mut changes = ChangeSet::new();
    let (Some(before), Some(after)) = (before.as_object(), after.as_object()) else {
        return changes;
    };

    for (key, after_value) in after {
        let before_value = before.get(key).cloned().unwrap_or(Value::Null);
        if &before_value != after_value {
            changes.insert(
                key.clone(),
                FieldChange {
                    before: before_value,
                    after: after_value.clone(),
                },
            );
        }
    }

    changes
}

/// Pending requests against the same target whose diffs touch any of the
/// draft's fields. Such overlaps must be surfaced before creating a second
/// request for the same data.
pub fn conflicts_with_pending<'a>(
    draft: &EditRequestDraft,
    requests: &'a [EditRequest],
) -> Vec<&'a EditRequest> {
    requests
        .iter()
        .filter(|request| request.status == EditRequestStatus::Pending)
        .filter(|request| {
            request.target_id == draft.target_id && request.request_type == draft.request_type
        })
        .filter(|request| {
            draft
                .changes
                .keys()
                .any(|key| request.changes.contains_key(key))
        })
        .collect()
}

/// Errors raised while applying an approved diff to a typed entity.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("field {field} is not editable on a {entity}")]
    UnknownField { entity: &'static str, field: String },
    #[error("field {field} rejected value {value}: expected {expected}")]
    InvalidValue {
        field: String,
        value: Value,
        expected: &'static str,
    },
}

pub fn apply_project_field(
    project: &mut Project,
    field: &str,
    value: &Value,
) -> Result<(), FieldError> {
    match field {
        "advertiser_name" => project.advertiser_name = required_string(field, value)?,
        "agency_name" => project.agency_name = optional_string(field, value)?,
        "appeal_point" => project.appeal_point = required_string(field, value)?,
        "universe_service_id" => project.universe_service_id = optional_string(field, value)?,
        "universe_service_name" => project.universe_service_name = optional_string(field, value)?,
        "delivery_start_date" => project.delivery_start_date = optional_date(field, value)?,
        "delivery_end_date" => project.delivery_end_date = optional_date(field, value)?,
        "person_in_charge" => project.person_in_charge = required_string(field, value)?,
        "sub_person_in_charge" => project.sub_person_in_charge = optional_string(field, value)?,
        "remarks" => project.remarks = optional_string(field, value)?,
        other => {
            return Err(FieldError::UnknownField {
                entity: "project",
                field: other.to_string(),
            })
        }
    }
    Ok(())
}

pub fn apply_segment_field(
    segment: &mut Segment,
    field: &str,
    value: &Value,
) -> Result<(), FieldError> {
    match field {
        "segment_name" => segment.segment_name = optional_string(field, value)?,
        "ads_account_id" => segment.ads_account_id = optional_string(field, value)?,
        "data_link_status" => {
            segment.data_link_status = enum_value(field, value, "a data link status")?
        }
        "location_request_status" => {
            segment.location_request_status = enum_value(field, value, "a location request status")?
        }
        "data_link_request_date" => {
            segment.data_link_request_date = optional_date(field, value)?
        }
        "segment_expire_date" => segment.segment_expire_date = optional_date(field, value)?,
        other => {
            return Err(FieldError::UnknownField {
                entity: "segment",
                field: other.to_string(),
            })
        }
    }
    Ok(())
}

pub fn apply_poi_field(
    poi: &mut PointOfInterest,
    field: &str,
    value: &Value,
) -> Result<(), FieldError> {
    match field {
        "poi_name" => poi.poi_name = required_string(field, value)?,
        "address" => poi.address = optional_string(field, value)?,
        "latitude" => poi.latitude = optional_number(field, value)?,
        "longitude" => poi.longitude = optional_number(field, value)?,
        other => {
            return Err(FieldError::UnknownField {
                entity: "poi",
                field: other.to_string(),
            })
        }
    }
    Ok(())
}

fn required_string(field: &str, value: &Value) -> Result<String, FieldError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| FieldError::InvalidValue {
            field: field.to_string(),
            value: value.clone(),
            expected: "a string",
        })
}

fn optional_string(field: &str, value: &Value) -> Result<Option<String>, FieldError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        other => Err(FieldError::InvalidValue {
            field: field.to_string(),
            value: other.clone(),
            expected: "a string or null",
        }),
    }
}

fn optional_date(field: &str, value: &Value) -> Result<Option<NaiveDate>, FieldError> {
    match value {
        Value::Null => Ok(None),
        Value::String(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| FieldError::InvalidValue {
                field: field.to_string(),
                value: value.clone(),
                expected: "a YYYY-MM-DD date or null",
            }),
        other => Err(FieldError::InvalidValue {
            field: field.to_string(),
            value: other.clone(),
            expected: "a YYYY-MM-DD date or null",
        }),
    }
}

fn optional_number(field: &str, value: &Value) -> Result<Option<f64>, FieldError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => {
            number
                .as_f64()
                .map(Some)
                .ok_or_else(|| FieldError::InvalidValue {
                    field: field.to_string(),
                    value: value.clone(),
                    expected: "a finite number or null",
                })
        }
        other => Err(FieldError::InvalidValue {
            field: field.to_string(),
            value: other.clone(),
            expected: "a finite number or null",
        }),
    }
}

fn enum_value<T>(field: &str, value: &Value, expected: &'static str) -> Result<T, FieldError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(value.clone()).map_err(|_| FieldError::InvalidValue {
        field: field.to_string(),
        value: value.clone(),
        expected,
    })
}
