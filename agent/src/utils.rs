//! Utility functions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Version information for the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Retry policy for the informer's boot envelope
#[derive(Debug, Clone)]
pub struct BackoffOptions {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,

    /// Total attempt ceiling, after which the caller gives up
    pub max_attempts: u32,
}

impl Default for BackoffOptions {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(300), // 5 minutes
            multiplier: 2.0,
            max_attempts: 10,
        }
    }
}

impl BackoffOptions {
    /// A policy that never sleeps, for tests.
    pub fn zero(max_attempts: u32) -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
            max_attempts,
        }
    }
}

/// Calculate exponential backoff delay
pub fn calc_exp_backoff(options: &BackoffOptions, attempt: u32) -> Duration {
    let delay_secs = options.base_delay.as_secs_f64() * options.multiplier.powi(attempt as i32);
    let capped_delay = delay_secs.min(options.max_delay.as_secs_f64());
    Duration::from_secs_f64(capped_delay)
}
