//! Shared data model and engine capability traits for `rendermail`.
//!
//! Every other crate in the workspace depends on this one. It carries no
//! I/O of its own.

pub mod engine;
pub mod env;
pub mod error;
pub mod types;
