//! HTTP client module

pub mod client;
