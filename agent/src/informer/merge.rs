//! Merge logic for the desired-state project list

use crate::models::desired_state::ProjectRecord;

/// Merge `candidate` into the project list.
///
/// A candidate with an empty id, name or ref is rejected as a no-op. An
/// unknown project name is appended. A known name with the same deployment id
/// is a no-op; a known name with a different id is replaced in place, keeping
/// its position. Entries are never removed. The boolean reports whether the
/// list changed.
pub fn ensure_project(
    mut projects: Vec<ProjectRecord>,
    candidate: ProjectRecord,
) -> (Vec<ProjectRecord>, bool) {
    if candidate.id.is_empty() || candidate.name.is_empty() || candidate.git_ref.is_empty() {
        return (projects, false);
    }

    match projects.iter().position(|p| p.name == candidate.name) {
        None => {
            projects.push(candidate);
            (projects, true)
        }
        Some(i) if projects[i].id == candidate.id => (projects, false),
        Some(i) => {
            projects[i] = candidate;
            (projects, true)
        }
    }
}
