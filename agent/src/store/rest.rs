//! REST state store
//!
//! Talks to the state store's object endpoint with get/create/replace verbs.
//! A create that hits an existing object answers 409, in which case the
//! object is replaced instead.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use tracing::debug;

use crate::errors::AgentError;
use crate::http::client::HttpClient;
use crate::models::desired_state::DesiredState;
use crate::store::StateStore;

/// Name of the desired-state object the informer maintains
pub const DEFAULT_OBJECT_NAME: &str = "deployments";

/// Configuration used to create a REST state store
pub struct Config {
    /// Client for the state store API
    pub http_client: Arc<HttpClient>,

    /// Name of the desired-state object
    pub object_name: String,
}

/// A `StateStore` backed by a REST object store
pub struct RestStateStore {
    client: Arc<HttpClient>,
    path: String,
}

impl RestStateStore {
    /// Create a new configured REST state store
    pub fn new(config: Config) -> Result<Self, AgentError> {
        if config.object_name.is_empty() {
            return Err(AgentError::InvalidConfig(
                "object name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client: config.http_client,
            path: format!("/v1/desiredstate/{}", config.object_name),
        })
    }
}

#[async_trait]
impl StateStore for RestStateStore {
    async fn get(&self) -> Result<DesiredState, AgentError> {
        self.client.get(&self.path).await
    }

    async fn ensure(&self, state: &DesiredState) -> Result<(), AgentError> {
        let status = self.client.post_raw(&self.path, state).await?;

        match status {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            StatusCode::CONFLICT => {
                debug!("desired state object exists, replacing");

                let status = self.client.put_raw(&self.path, state).await?;
                match status {
                    s if s.is_success() => Ok(()),
                    StatusCode::NOT_FOUND => Err(AgentError::NotFound(self.path.clone())),
                    s => Err(AgentError::UnexpectedStatus(s.as_u16())),
                }
            }
            StatusCode::NOT_FOUND => Err(AgentError::NotFound(self.path.clone())),
            s => Err(AgentError::UnexpectedStatus(s.as_u16())),
        }
    }
}
