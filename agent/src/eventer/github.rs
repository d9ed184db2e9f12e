//! GitHub deployment eventer
//!
//! Uses GitHub Deployment records as the event backend. Deployment lists are
//! fetched conditionally with `If-None-Match` so unchanged data is never
//! re-downloaded; statuses are fetched separately per record because the list
//! endpoint does not embed them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use crate::errors::AgentError;
use crate::eventer::Eventer;
use crate::http::client::{Conditional, HttpClient};
use crate::models::deployment::{DeploymentEvent, DeploymentStatus, RawDeployment};

/// Capacity of the event channel. A full channel stalls the poller until the
/// informer catches up; polling is throttled to the pace of reconciliation.
const EVENT_CHANNEL_CAPACITY: usize = 1;

/// Body posted to the deployment status endpoint
#[derive(Debug, Serialize)]
struct StatusBody {
    state: &'static str,
}

/// Configuration used to create a GitHub eventer
pub struct Config {
    /// Client for the GitHub API; carries the auth token
    pub http_client: Arc<HttpClient>,

    /// Organisation or owner the projects live under
    pub organisation: String,

    /// Interval between poll ticks; the first tick fires only after one full
    /// interval has elapsed
    pub poll_interval: Duration,
}

/// An `Eventer` backed by GitHub Deployment records
#[derive(Clone)]
pub struct GithubEventer {
    client: Arc<HttpClient>,
    organisation: String,
    poll_interval: Duration,

    // Validation token per project. Only configured project names are ever
    // inserted, so the map stays bounded by the project list. Shared between
    // the poll task and fetch_latest, hence the lock.
    etags: Arc<Mutex<HashMap<String, String>>>,
}

impl GithubEventer {
    /// Create a new configured GitHub eventer
    pub fn new(config: Config) -> Result<Self, AgentError> {
        if config.organisation.is_empty() {
            return Err(AgentError::InvalidConfig(
                "organisation must not be empty".to_string(),
            ));
        }
        if config.poll_interval.is_zero() {
            return Err(AgentError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            client: config.http_client,
            organisation: config.organisation,
            poll_interval: config.poll_interval,
            etags: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    fn deployments_path(&self, project: &str, environment: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("environment", environment)
            .finish();
        format!(
            "/repos/{}/{}/deployments?{}",
            self.organisation, project, query
        )
    }

    fn statuses_path(&self, project: &str, id: i64) -> String {
        format!(
            "/repos/{}/{}/deployments/{}/statuses",
            self.organisation, project, id
        )
    }

    /// Fetch new deployment records for a project, newest first.
    ///
    /// Presents the stored validation token so an unchanged remote answers
    /// 304, which surfaces as `NotFound` (the quiet majority case of a poll
    /// tick). The token is advanced as soon as a fresh response arrives, even
    /// if a later step fails, so the same data is not re-examined forever.
    async fn fetch_new_deployments(
        &self,
        project: &str,
        environment: &str,
        only_pending: bool,
    ) -> Result<Vec<RawDeployment>, AgentError> {
        let path = self.deployments_path(project, environment);

        let etag = self.etags.lock().await.get(project).cloned();

        let response = self
            .client
            .get_conditional::<Vec<RawDeployment>>(&path, etag.as_deref())
            .await?;

        let mut deployments = match response {
            Conditional::NotModified { .. } => {
                return Err(AgentError::NotFound(format!(
                    "no new deployments for project '{}'",
                    project
                )));
            }
            Conditional::Fresh { etag, body } => {
                if let Some(etag) = etag {
                    self.etags.lock().await.insert(project.to_string(), etag);
                }
                body
            }
        };

        for deployment in &mut deployments {
            deployment.statuses = self.fetch_statuses(project, deployment.id).await?;
        }

        if only_pending {
            deployments.retain(|d| !d.is_finished());
        }

        if deployments.is_empty() {
            return Err(AgentError::NotFound(format!(
                "no pending deployments for project '{}'",
                project
            )));
        }

        Ok(deployments)
    }

    /// Fetch the status history of a single deployment record
    async fn fetch_statuses(
        &self,
        project: &str,
        id: i64,
    ) -> Result<Vec<DeploymentStatus>, AgentError> {
        let path = self.statuses_path(project, id);

        match self.client.get::<Vec<DeploymentStatus>>(&path).await {
            // A vanished statuses endpoint is not the benign no-new-data
            // signal; surface it as a remote misbehaviour instead.
            Err(e) if e.is_not_found() => Err(AgentError::UnexpectedStatus(404)),
            other => other,
        }
    }
}

#[async_trait]
impl Eventer for GithubEventer {
    async fn start(
        &self,
        projects: &[String],
        environment: &str,
    ) -> Result<mpsc::Receiver<DeploymentEvent>, AgentError> {
        info!(
            interval = ?self.poll_interval,
            "starting polling for github deployment events"
        );

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let eventer = self.clone();
        let projects = projects.to_vec();
        let environment = environment.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => {
                        info!("event stream closed, stopping poller");
                        return;
                    }
                    _ = tokio::time::sleep(eventer.poll_interval) => {}
                }

                for project in &projects {
                    let deployments = match eventer
                        .fetch_new_deployments(project, &environment, true)
                        .await
                    {
                        Ok(deployments) => deployments,
                        Err(e) if e.is_not_found() => {
                            debug!(project = %project, "no new deployment events");
                            continue;
                        }
                        Err(e) => {
                            error!(project = %project, "could not fetch deployment events: {}", e);
                            continue;
                        }
                    };

                    for deployment in deployments {
                        let event = deployment.into_event(project);
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn fetch_latest(
        &self,
        project: &str,
        environment: &str,
    ) -> Result<DeploymentEvent, AgentError> {
        debug!(project = %project, "fetching latest deployment");

        let mut deployments = self
            .fetch_new_deployments(project, environment, false)
            .await?;

        // The remote orders newest first.
        let latest = deployments.remove(0);
        Ok(latest.into_event(project))
    }

    async fn set_pending_status(&self, event: &DeploymentEvent) -> Result<(), AgentError> {
        debug!(project = %event.name, id = event.id, "posting pending deployment status");

        let path = self.statuses_path(&event.name, event.id);
        self.client
            .post_created(&path, &StatusBody { state: "pending" })
            .await
    }
}
