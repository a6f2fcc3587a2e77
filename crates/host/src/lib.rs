//! Access to the host render engine.
//!
//! [`connector::HostConnector`] turns whichever engine capability is
//! reachable into an [`connector::EngineHandle`]; [`bridge`] provides the
//! HTTP client for the engine's scripting bridge.

pub mod bridge;
pub mod connector;
