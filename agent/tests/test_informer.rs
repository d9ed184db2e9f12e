//! Informer integration tests using mock collaborators

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use conveyor::errors::AgentError;
use conveyor::eventer::Eventer;
use conveyor::informer::{Config, Informer};
use conveyor::models::deployment::DeploymentEvent;
use conveyor::models::desired_state::{DesiredState, ProjectRecord};
use conveyor::store::StateStore;
use conveyor::utils::BackoffOptions;

fn event(id: i64, name: &str, sha: &str) -> DeploymentEvent {
    DeploymentEvent {
        id,
        name: name.to_string(),
        sha: sha.to_string(),
    }
}

/// Mock eventer serving canned latest records and a finite continuous stream.
/// The stream closes once drained, which lets `run` return for assertions.
struct MockEventer {
    latest: HashMap<String, DeploymentEvent>,
    continuous: Mutex<Vec<DeploymentEvent>>,
    pending_posts: Mutex<Vec<DeploymentEvent>>,
}

impl MockEventer {
    fn new(latest: Vec<DeploymentEvent>, continuous: Vec<DeploymentEvent>) -> Self {
        Self {
            latest: latest.into_iter().map(|e| (e.name.clone(), e)).collect(),
            continuous: Mutex::new(continuous),
            pending_posts: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl Eventer for MockEventer {
    async fn start(
        &self,
        _projects: &[String],
        _environment: &str,
    ) -> Result<mpsc::Receiver<DeploymentEvent>, AgentError> {
        let (tx, rx) = mpsc::channel(16);
        let events = std::mem::take(&mut *self.continuous.lock().await);

        tokio::spawn(async move {
            for event in events {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        });

        Ok(rx)
    }

    async fn fetch_latest(
        &self,
        project: &str,
        _environment: &str,
    ) -> Result<DeploymentEvent, AgentError> {
        self.latest
            .get(project)
            .cloned()
            .ok_or_else(|| AgentError::NotFound(format!("no deployment for '{}'", project)))
    }

    async fn set_pending_status(&self, event: &DeploymentEvent) -> Result<(), AgentError> {
        self.pending_posts.lock().await.push(event.clone());
        Ok(())
    }
}

/// Mock state store keeping the object in memory
struct MockStore {
    state: Mutex<Option<DesiredState>>,
    fail_get: bool,
    get_calls: AtomicU32,
    ensure_calls: AtomicU32,
}

impl MockStore {
    fn empty() -> Self {
        Self {
            state: Mutex::new(None),
            fail_get: false,
            get_calls: AtomicU32::new(0),
            ensure_calls: AtomicU32::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            fail_get: true,
            ..Self::empty()
        }
    }

    async fn current(&self) -> Option<DesiredState> {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl StateStore for MockStore {
    async fn get(&self) -> Result<DesiredState, AgentError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_get {
            return Err(AgentError::StoreError("test error".to_string()));
        }

        match &*self.state.lock().await {
            Some(state) => Ok(state.clone()),
            None => Err(AgentError::NotFound("desired state".to_string())),
        }
    }

    async fn ensure(&self, state: &DesiredState) -> Result<(), AgentError> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().await = Some(state.clone());
        Ok(())
    }
}

fn informer(
    eventer: Arc<MockEventer>,
    store: Arc<MockStore>,
    projects: Vec<&str>,
) -> Informer {
    Informer::new(Config {
        eventer,
        store,
        backoff: BackoffOptions::zero(3),
        environment: "production".to_string(),
        projects: projects.into_iter().map(|p| p.to_string()).collect(),
    })
    .unwrap()
}

#[tokio::test]
async fn test_bootstrap_is_partial_when_a_project_has_no_deployment() {
    let eventer = Arc::new(MockEventer::new(vec![event(7, "b", "sha-b")], vec![]));
    let store = Arc::new(MockStore::empty());

    let result = informer(eventer.clone(), store.clone(), vec!["a", "b"])
        .run()
        .await;
    assert!(result.is_ok());

    let state = store.current().await.unwrap();
    assert!(state.project("a").is_none());
    assert_eq!(
        state.project("b"),
        Some(&ProjectRecord {
            id: "7".to_string(),
            name: "b".to_string(),
            git_ref: "sha-b".to_string(),
        })
    );
    assert_eq!(state.projects.len(), 1);
    assert_eq!(eventer.pending_posts.lock().await.len(), 1);
}

#[tokio::test]
async fn test_bootstrap_then_continuous_event_updates_state() {
    let eventer = Arc::new(MockEventer::new(
        vec![event(100, "api", "sha1")],
        vec![event(101, "api", "sha2")],
    ));
    let store = Arc::new(MockStore::empty());

    let result = informer(eventer.clone(), store.clone(), vec!["api"])
        .run()
        .await;
    assert!(result.is_ok());

    let state = store.current().await.unwrap();
    assert_eq!(
        state.projects,
        vec![ProjectRecord {
            id: "101".to_string(),
            name: "api".to_string(),
            git_ref: "sha2".to_string(),
        }]
    );

    // One pending status per change, posted after each persist
    let posts = eventer.pending_posts.lock().await;
    assert_eq!(
        *posts,
        vec![event(100, "api", "sha1"), event(101, "api", "sha2")]
    );
    assert_eq!(store.ensure_calls.load(Ordering::SeqCst), 2);

    // State is re-read before every continuous merge
    assert_eq!(store.get_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_repeated_event_does_not_persist_or_notify_again() {
    let eventer = Arc::new(MockEventer::new(
        vec![event(100, "api", "sha1")],
        vec![event(100, "api", "sha1")],
    ));
    let store = Arc::new(MockStore::empty());

    informer(eventer.clone(), store.clone(), vec!["api"])
        .run()
        .await
        .unwrap();

    assert_eq!(store.ensure_calls.load(Ordering::SeqCst), 1);
    assert_eq!(eventer.pending_posts.lock().await.len(), 1);
}

#[tokio::test]
async fn test_retry_budget_exhaustion_returns_terminal_error() {
    let eventer = Arc::new(MockEventer::new(vec![], vec![]));
    let store = Arc::new(MockStore::failing());

    let result = informer(eventer, store.clone(), vec!["api"]).run().await;

    assert!(matches!(result, Err(AgentError::StoreError(_))));
    // Three attempts, each failing on the initial state read
    assert_eq!(store.get_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_boot_sequence_runs_at_most_once() {
    let eventer = Arc::new(MockEventer::new(vec![event(1, "api", "sha1")], vec![]));
    let store = Arc::new(MockStore::empty());

    let informer = informer(eventer, store, vec!["api"]);
    informer.run().await.unwrap();

    let second = informer.run().await;
    assert!(matches!(second, Err(AgentError::Internal(_))));
}

#[tokio::test]
async fn test_rejects_invalid_config() {
    let eventer = Arc::new(MockEventer::new(vec![], vec![]));
    let store = Arc::new(MockStore::empty());

    let no_projects = Informer::new(Config {
        eventer: eventer.clone(),
        store: store.clone(),
        backoff: BackoffOptions::default(),
        environment: "production".to_string(),
        projects: vec![],
    });
    assert!(matches!(no_projects, Err(AgentError::InvalidConfig(_))));

    let empty_name = Informer::new(Config {
        eventer: eventer.clone(),
        store: store.clone(),
        backoff: BackoffOptions::default(),
        environment: "production".to_string(),
        projects: vec!["api".to_string(), String::new()],
    });
    assert!(matches!(empty_name, Err(AgentError::InvalidConfig(_))));

    let empty_environment = Informer::new(Config {
        eventer,
        store,
        backoff: BackoffOptions::default(),
        environment: String::new(),
        projects: vec!["api".to_string()],
    });
    assert!(matches!(empty_environment, Err(AgentError::InvalidConfig(_))));
}
