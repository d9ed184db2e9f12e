//! Deployment models

use serde::{Deserialize, Serialize};

/// A deployment request discovered at the remote VCS: "project `name` should
/// be at revision `sha`, identified remotely by `id`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentEvent {
    /// Remote-assigned deployment id, unique per project and environment
    pub id: i64,

    /// Name of the project the deployment belongs to
    pub name: String,

    /// Revision to deploy, e.g. a commit SHA
    pub sha: String,
}

/// State of a single deployment status entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatusState {
    Pending,
    Success,
    Failure,

    /// Any remote-defined state we do not know; treated as terminal
    #[serde(other)]
    Unknown,
}

impl DeploymentStatusState {
    pub fn is_pending(&self) -> bool {
        matches!(self, DeploymentStatusState::Pending)
    }
}

/// A status entry attached to a deployment record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentStatus {
    pub state: DeploymentStatusState,
}

/// A deployment record as returned by the remote list endpoint. Statuses are
/// not embedded in the list response and are fetched separately per record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDeployment {
    pub id: i64,

    pub sha: String,

    pub environment: String,

    #[serde(default)]
    pub statuses: Vec<DeploymentStatus>,
}

impl RawDeployment {
    /// A record is finished once any non-pending status exists. A record with
    /// zero statuses has not started and counts as pending.
    pub fn is_finished(&self) -> bool {
        self.statuses.iter().any(|s| !s.state.is_pending())
    }

    /// Convert into the event consumed by the informer.
    pub fn into_event(self, project: &str) -> DeploymentEvent {
        DeploymentEvent {
            id: self.id,
            name: project.to_string(),
            sha: self.sha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(states: &[DeploymentStatusState]) -> RawDeployment {
        RawDeployment {
            id: 1,
            sha: "abc123".to_string(),
            environment: "production".to_string(),
            statuses: states
                .iter()
                .cloned()
                .map(|state| DeploymentStatus { state })
                .collect(),
        }
    }

    #[test]
    fn test_zero_statuses_is_not_finished() {
        assert!(!record(&[]).is_finished());
    }

    #[test]
    fn test_all_pending_is_not_finished() {
        assert!(!record(&[DeploymentStatusState::Pending]).is_finished());
        assert!(!record(&[
            DeploymentStatusState::Pending,
            DeploymentStatusState::Pending
        ])
        .is_finished());
    }

    #[test]
    fn test_any_terminal_status_is_finished() {
        assert!(record(&[
            DeploymentStatusState::Pending,
            DeploymentStatusState::Success
        ])
        .is_finished());
        assert!(record(&[DeploymentStatusState::Failure]).is_finished());
        assert!(record(&[DeploymentStatusState::Unknown]).is_finished());
    }

    #[test]
    fn test_unknown_state_deserializes() {
        let status: DeploymentStatus = serde_json::from_str(r#"{"state":"error"}"#).unwrap();
        assert_eq!(status.state, DeploymentStatusState::Unknown);

        let status: DeploymentStatus = serde_json::from_str(r#"{"state":"pending"}"#).unwrap();
        assert!(status.state.is_pending());
    }
}
