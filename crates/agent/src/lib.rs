//! `rendermail-agent` library crate.
//!
//! Holds the monitoring loop and the run orchestration so they can be
//! driven from integration tests. The binary entrypoint lives in
//! `main.rs`.

pub mod config;
pub mod logging;
pub mod monitor;
pub mod orchestrator;
