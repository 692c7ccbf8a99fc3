use chrono::NaiveDate;

use super::config::StatusConfig;
use crate::workflows::pipeline::domain::{DataLinkStatus, PointOfInterest, Project, Segment};

/// Intermediate predicate values shared by the resolution chain and the
/// counters reported back to callers.
pub(crate) struct StatusSignals {
    pub segment_count: usize,
    pub poi_count: usize,
    pub has_all_account_ids: bool,
    pub has_service_id: bool,
    pub all_segments_have_pois: bool,
    pub segments_missing_pois: usize,
    pub segments_missing_account_id: usize,
    pub linked_segment_count: usize,
    pub is_all_linked: bool,
    pub is_all_requested_or_linked: bool,
    pub is_expiring_soon: bool,
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(str::trim).unwrap_or("").is_empty()
}

pub(crate) fn compute_signals(
    project: &Project,
    all_segments: &[Segment],
    all_pois: &[PointOfInterest],
    today: NaiveDate,
    config: &StatusConfig,
) -> StatusSignals {
    let segments: Vec<&Segment> = all_segments
        .iter()
        .filter(|segment| segment.project_id == project.project_id)
        .collect();
    let segment_count = segments.len();

    // Only POIs bound to one of this project's segments count; standalone
    // visit-measurement POIs never influence the stage.
    let pois: Vec<&PointOfInterest> = all_pois
        .iter()
        .filter(|poi| match &poi.segment_id {
            Some(id) => segments.iter().any(|segment| segment.segment_id == *id),
            None => false,
        })
        .collect();
    let poi_count = pois.len();

    let segments_missing_account_id = segments
        .iter()
        .filter(|segment| is_blank(segment.ads_account_id.as_deref()))
        .count();
    let has_all_account_ids = segment_count > 0 && segments_missing_account_id == 0;

    let has_service_id = !is_blank(project.universe_service_id.as_deref());

    let segments_missing_pois = segments
        .iter()
        .filter(|segment| {
            !pois
                .iter()
                .any(|poi| poi.segment_id.as_ref() == Some(&segment.segment_id))
        })
        .count();
    let all_segments_have_pois = segment_count > 0 && segments_missing_pois == 0;

    let linked_segment_count = segments
        .iter()
        .filter(|segment| segment.data_link_status == DataLinkStatus::Linked)
        .count();
    let requested_segment_count = segments
        .iter()
        .filter(|segment| segment.data_link_status == DataLinkStatus::Requested)
        .count();

    let is_all_linked = segment_count > 0 && linked_segment_count == segment_count;
    let is_all_requested_or_linked =
        segment_count > 0 && linked_segment_count + requested_segment_count == segment_count;

    let is_expiring_soon = is_all_linked
        && segments.iter().any(|segment| {
            segment
                .segment_expire_date
                .map(|expire| {
                    let days_left = (expire - today).num_days();
                    (0..=config.expiry_window_days).contains(&days_left)
                })
                .unwrap_or(false)
        });

    StatusSignals {
        segment_count,
        poi_count,
        has_all_account_ids,
        has_service_id,
        all_segments_have_pois,
        segments_missing_pois,
        segments_missing_account_id,
        linked_segment_count,
        is_all_linked,
        is_all_requested_or_linked,
        is_expiring_soon,
    }
}
