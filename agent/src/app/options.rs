//! Application configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::store::rest::DEFAULT_OBJECT_NAME;
use crate::utils::BackoffOptions;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// GitHub event source configuration
    pub github: GithubOptions,

    /// State store configuration
    pub store: StoreOptions,

    /// Request timeout for all remote calls
    pub http_timeout: Duration,

    /// Retry policy for the informer boot envelope
    pub backoff: BackoffOptions,

    /// Enable the local health/version server
    pub enable_server: bool,

    /// Server configuration
    pub server: ServerOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            github: GithubOptions::default(),
            store: StoreOptions::default(),
            http_timeout: Duration::from_secs(30),
            backoff: BackoffOptions::default(),
            enable_server: true,
            server: ServerOptions::default(),
        }
    }
}

/// GitHub event source options
#[derive(Debug, Clone)]
pub struct GithubOptions {
    /// API base URL
    pub base_url: String,

    /// Organisation or owner the projects live under
    pub organisation: String,

    /// OAuth token for the API
    pub token: SecretString,

    /// Deployment environment to watch
    pub environment: String,

    /// Projects to reconcile, in order
    pub projects: Vec<String>,

    /// Interval between poll ticks
    pub poll_interval: Duration,
}

impl Default for GithubOptions {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            organisation: String::new(),
            token: SecretString::from(String::new()),
            environment: "production".to_string(),
            projects: vec![],
            poll_interval: Duration::from_secs(60),
        }
    }
}

/// State store options
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// State store base URL
    pub base_url: String,

    /// Name of the desired-state object
    pub object_name: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            object_name: DEFAULT_OBJECT_NAME.to_string(),
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}
