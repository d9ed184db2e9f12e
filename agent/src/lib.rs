//! Conveyor Agent Library
//!
//! Core modules for the conveyor deployment-intent agent. The agent polls a
//! hosted VCS for deployment records, turns them into events and reconciles
//! them into a shared desired-state object.

pub mod app;
pub mod errors;
pub mod eventer;
pub mod http;
pub mod informer;
pub mod logs;
pub mod models;
pub mod server;
pub mod storage;
pub mod store;
pub mod utils;
