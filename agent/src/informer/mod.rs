//! Reconciliation loop
//!
//! The informer owns the retry-wrapped boot sequence: load the current
//! desired state, bootstrap any project missing from it via the eventer's
//! latest-deployment fetch, then drain the continuous event stream, merging
//! every event into desired state and persisting it.

pub mod merge;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::errors::AgentError;
use crate::eventer::Eventer;
use crate::informer::merge::ensure_project;
use crate::models::deployment::DeploymentEvent;
use crate::models::desired_state::{DesiredState, ProjectRecord};
use crate::store::StateStore;
use crate::utils::{calc_exp_backoff, BackoffOptions};

/// Configuration used to create an informer
pub struct Config {
    /// Source of deployment events
    pub eventer: Arc<dyn Eventer>,

    /// Persistence for the desired-state object
    pub store: Arc<dyn StateStore>,

    /// Retry policy for the boot envelope
    pub backoff: BackoffOptions,

    /// Deployment environment to watch
    pub environment: String,

    /// Projects to reconcile, in order
    pub projects: Vec<String>,
}

/// The reconciliation service
pub struct Informer {
    eventer: Arc<dyn Eventer>,
    store: Arc<dyn StateStore>,
    backoff: BackoffOptions,
    environment: String,
    projects: Vec<String>,

    // The boot sequence runs at most once per instance.
    started: AtomicBool,
}

impl Informer {
    /// Create a new configured informer
    pub fn new(config: Config) -> Result<Self, AgentError> {
        if config.environment.is_empty() {
            return Err(AgentError::InvalidConfig(
                "environment must not be empty".to_string(),
            ));
        }
        if config.projects.is_empty() || config.projects.iter().any(|p| p.is_empty()) {
            return Err(AgentError::InvalidConfig(
                "projects must not be empty or contain empty names".to_string(),
            ));
        }

        Ok(Self {
            eventer: config.eventer,
            store: config.store,
            backoff: config.backoff,
            environment: config.environment,
            projects: config.projects,
            started: AtomicBool::new(false),
        })
    }

    /// Run the boot sequence under the retry envelope.
    ///
    /// This does not return under normal operation. A returned error means
    /// the retry budget is exhausted and the agent cannot make progress
    /// without its remote dependencies; the caller decides the exit policy.
    pub async fn run(&self) -> Result<(), AgentError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(AgentError::Internal(
                "informer boot sequence already running".to_string(),
            ));
        }

        let mut attempt: u32 = 0;
        loop {
            let err = match self.run_once().await {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };

            attempt += 1;
            if attempt >= self.backoff.max_attempts {
                error!(
                    attempts = attempt,
                    "stopping informer boot retries due to too many errors: {}", err
                );
                return Err(err);
            }

            warn!(attempt = attempt, "retrying informer boot due to error: {}", err);
            tokio::time::sleep(calc_exp_backoff(&self.backoff, attempt)).await;
        }
    }

    /// One retry-envelope attempt: bootstrap pass, then steady-state pass.
    async fn run_once(&self) -> Result<(), AgentError> {
        let mut state = self.read_state().await?;

        // Bootstrap pass. A project with no deployment yet is skipped; it is
        // picked up by the continuous path once its first event appears.
        for project in &self.projects {
            let event = match self.eventer.fetch_latest(project, &self.environment).await {
                Ok(event) => event,
                Err(e) if e.is_not_found() => {
                    debug!(project = %project, phase = "bootstrap", "no deployment yet, skipping");
                    continue;
                }
                Err(e) => {
                    error!(project = %project, phase = "bootstrap", "fetching latest deployment failed");
                    return Err(e);
                }
            };

            self.align(event, &mut state).await?;
        }

        // Steady-state pass. The channel receive is the loop's only blocking
        // point; state is re-read per event because it may have changed
        // out-of-band.
        let mut events = self.eventer.start(&self.projects, &self.environment).await?;
        while let Some(event) = events.recv().await {
            let mut state = self.read_state().await?;
            self.align(event, &mut state).await?;
        }

        Ok(())
    }

    /// Read the desired state; an absent object means "start from empty".
    async fn read_state(&self) -> Result<DesiredState, AgentError> {
        match self.store.get().await {
            Ok(state) => Ok(state),
            Err(e) if e.is_not_found() => Ok(DesiredState::default()),
            Err(e) => Err(e),
        }
    }

    /// Merge an event into the state; when the merge changed anything,
    /// persist first, then post the pending status. The store is the source
    /// of truth and must be durable before the notification goes out.
    async fn align(
        &self,
        event: DeploymentEvent,
        state: &mut DesiredState,
    ) -> Result<(), AgentError> {
        let candidate = ProjectRecord {
            id: event.id.to_string(),
            name: event.name.clone(),
            git_ref: event.sha.clone(),
        };

        let (projects, changed) = ensure_project(std::mem::take(&mut state.projects), candidate);
        state.projects = projects;
        if !changed {
            return Ok(());
        }
        debug!(project = %event.name, "found new deployment");

        self.store.ensure(state).await?;
        self.eventer.set_pending_status(&event).await?;

        Ok(())
    }
}
