//! Desired-state store
//!
//! The store persists the desired-state document the informer maintains.
//! `ensure` is an upsert: create when absent, replace when present.

pub mod rest;

use async_trait::async_trait;

use crate::errors::AgentError;
use crate::models::desired_state::DesiredState;

/// Access to the persisted desired-state object
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the current desired state. `NotFound` means the object has not
    /// been created yet.
    async fn get(&self) -> Result<DesiredState, AgentError>;

    /// Persist the desired state, creating the object when absent
    async fn ensure(&self, state: &DesiredState) -> Result<(), AgentError>;
}
