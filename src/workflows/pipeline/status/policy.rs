use super::rules::StatusSignals;
use super::PipelineStatus;

/// Resolve the winning stage from the computed signals.
///
/// Strict priority order, first match wins: several predicates can hold at
/// once, and a later rule must never override an earlier, more urgent one.
pub(crate) fn resolve(signals: &StatusSignals) -> (PipelineStatus, String) {
    if signals.segment_count == 0 {
        return (
            PipelineStatus::Draft,
            "no segments registered under this project".to_string(),
        );
    }

    if signals.is_expiring_soon {
        return (
            PipelineStatus::ExpiringSoon,
            "a linked segment expires within the warning window".to_string(),
        );
    }

    if signals.is_all_linked {
        return (
            PipelineStatus::Linked,
            "data linkage completed for every segment".to_string(),
        );
    }

    if signals.is_all_requested_or_linked {
        return (
            PipelineStatus::LinkRequested,
            "data linkage requested and awaiting completion".to_string(),
        );
    }

    if !signals.all_segments_have_pois {
        return (
            PipelineStatus::WaitingPoi,
            format!(
                "{} segment(s) have no registered points of interest",
                signals.segments_missing_pois
            ),
        );
    }

    if !signals.has_all_account_ids {
        return (
            PipelineStatus::WaitingAccountId,
            format!(
                "{} segment(s) are missing an ads account id",
                signals.segments_missing_account_id
            ),
        );
    }

    if !signals.has_service_id {
        return (
            PipelineStatus::WaitingServiceId,
            "the project's service id is not filled in".to_string(),
        );
    }

    (
        PipelineStatus::InProgress,
        "all inputs recorded; ready for a data linkage request".to_string(),
    )
}
