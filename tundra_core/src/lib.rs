//!
//! Core contracts for Tundra
//!
//! Provides the pieces shared by every Tundra backend: the error taxonomy
//! surfaced to the host orchestrator, the declared attribute-schema surface,
//! credentials plumbing, and logging setup.
#![deny(missing_docs)]

pub use errors::ReconcileError;
pub use provider::Provider;

pub mod config;
pub mod errors;
pub mod logging;
pub mod provider;
pub mod schema;
