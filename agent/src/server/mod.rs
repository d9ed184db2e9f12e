//! Local HTTP server for health and version endpoints

pub mod handlers;
pub mod serve;
pub mod state;
