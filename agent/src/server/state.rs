//! Server state

use chrono::{DateTime, Utc};

/// State shared with request handlers
pub struct ServerState {
    /// When the agent came up
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
