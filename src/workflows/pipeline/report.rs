//! Read-side assembly: derived status listings filtered per actor.

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{Actor, Project};
use super::status::{DisplayGroup, ProjectStatusInfo, StatusCounts, StatusEngine};
use super::store::{EntityStore, StoreError};
use super::visibility::can_view_project;

/// One row of the project list: the record plus its derived stage.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectOverview {
    pub project: Project,
    pub status: ProjectStatusInfo,
    pub display_group: DisplayGroup,
}

/// Load every entity, derive each project's stage, and keep what `actor` may
/// see. Derivation and the visibility check both run per call; nothing is
/// cached between renders.
pub fn visible_projects<S: EntityStore>(
    store: &S,
    engine: &StatusEngine,
    actor: &Actor,
    today: NaiveDate,
) -> Result<Vec<ProjectOverview>, StoreError> {
    let projects = store.projects()?;
    let segments = store.segments()?;
    let pois = store.pois()?;

    Ok(projects
        .into_iter()
        .filter_map(|project| {
            let status = engine.derive(&project, &segments, &pois, today);
            can_view_project(actor, &project, status.status).then(|| ProjectOverview {
                display_group: status.status.display_group(),
                status,
                project,
            })
        })
        .collect())
}

/// Dashboard tallies across the full project list.
pub fn status_board<S: EntityStore>(
    store: &S,
    engine: &StatusEngine,
    today: NaiveDate,
) -> Result<StatusCounts, StoreError> {
    let projects = store.projects()?;
    let segments = store.segments()?;
    let pois = store.pois()?;
    Ok(engine.count_by_status(&projects, &segments, &pois, today))
}
