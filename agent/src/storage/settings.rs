//! Settings file management

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::AgentError;
use crate::logs::LogLevel;

/// Agent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// GitHub event source configuration
    pub github: GithubSettings,

    /// State store configuration
    #[serde(default)]
    pub store: StoreSettings,

    /// Enable the local health/version server
    #[serde(default = "default_true")]
    pub enable_server: bool,

    /// Server bind host
    #[serde(default = "default_server_host")]
    pub server_host: String,

    /// Server bind port
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Request timeout in seconds for all remote calls
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

/// GitHub event source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubSettings {
    /// API base URL
    #[serde(default = "default_github_base_url")]
    pub base_url: String,

    /// Organisation or owner the projects live under
    pub organisation: String,

    /// OAuth token; may also come from the CONVEYOR_GITHUB_TOKEN env var
    #[serde(default)]
    pub token: String,

    /// Deployment environment to watch
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Projects to reconcile, in order
    pub projects: Vec<String>,

    /// Polling interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

/// State store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// State store base URL
    #[serde(default = "default_store_base_url")]
    pub base_url: String,

    /// Name of the desired-state object
    #[serde(default = "default_object_name")]
    pub object_name: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: default_store_base_url(),
            object_name: default_object_name(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_http_timeout() -> u64 {
    30
}

fn default_github_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_store_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_object_name() -> String {
    crate::store::rest::DEFAULT_OBJECT_NAME.to_string()
}

impl Settings {
    /// Load settings from a JSON file
    pub async fn load(path: &Path) -> Result<Self, AgentError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }
}
