//! Deployment eventer
//!
//! An eventer discovers deployment-intent events at a remote change source
//! and hands them to the informer, either one-shot (`fetch_latest`, used at
//! bootstrap) or as a continuous stream (`start`).

pub mod github;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::AgentError;
use crate::models::deployment::DeploymentEvent;

/// A service that checks for deployment events at a remote backend
#[async_trait]
pub trait Eventer: Send + Sync {
    /// Start the continuous polling loop for the given projects and
    /// environment, returning the receiving half of the event stream. The
    /// poller stops when the receiver is dropped.
    async fn start(
        &self,
        projects: &[String],
        environment: &str,
    ) -> Result<mpsc::Receiver<DeploymentEvent>, AgentError>;

    /// Fetch the latest deployment for a project regardless of its completion
    /// status. `NotFound` means the remote holds no record for the project,
    /// or that nothing changed since the previous fetch.
    async fn fetch_latest(
        &self,
        project: &str,
        environment: &str,
    ) -> Result<DeploymentEvent, AgentError>;

    /// Post a `pending` status against the event's remote deployment record
    async fn set_pending_status(&self, event: &DeploymentEvent) -> Result<(), AgentError>;
}
