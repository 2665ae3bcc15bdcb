//! traefik-officer daemon library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `traefik-officer` is used as a binary (main.rs).

pub mod cli;
pub mod logging;
pub mod metrics_server;
pub mod orchestrator;
