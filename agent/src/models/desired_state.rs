//! Desired-state document models

use serde::{Deserialize, Serialize};

/// The currently tracked deployment of a single project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Remote deployment id, stringified for the consuming controller
    pub id: String,

    /// Project name; unique key within the desired-state document
    pub name: String,

    /// Revision the project should be at
    #[serde(rename = "ref")]
    pub git_ref: String,
}

/// The externally persisted document the informer maintains. Projects are
/// only ever added or updated by this agent, never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
}

impl DesiredState {
    pub fn project(&self, name: &str) -> Option<&ProjectRecord> {
        self.projects.iter().find(|p| p.name == name)
    }
}
