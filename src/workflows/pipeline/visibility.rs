//! Access rules for project list and detail reads.
//!
//! Both checks are pure functions over already-loaded values and must be
//! re-evaluated per request: a project's derived stage (and with it the
//! answer) can change between two renders without any visibility event.

use super::domain::{Actor, ActorRole, Project};
use super::status::PipelineStatus;

/// Whether `actor` may see `project` given its derived stage.
///
/// Admins see every project. Sales see their own assignments at any stage,
/// and peers' projects only once data linkage has fully completed.
pub fn can_view_project(actor: &Actor, project: &Project, derived_status: PipelineStatus) -> bool {
    match actor.role {
        ActorRole::Admin => true,
        ActorRole::Sales => {
            project.is_assigned_to(&actor.name) || derived_status == PipelineStatus::Linked
        }
    }
}

/// Whether `actor` may edit `project` at all (direct edits and edit requests
/// alike). Sales only edit projects they are assigned to.
pub fn can_edit_project(actor: &Actor, project: &Project) -> bool {
    match actor.role {
        ActorRole::Admin => true,
        ActorRole::Sales => project.is_assigned_to(&actor.name),
    }
}
