//! Data models

pub mod deployment;
pub mod desired_state;
