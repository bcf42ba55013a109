//! The trait every Tundra backend implements.

use anyhow::Result;
use async_trait::async_trait;

use crate::config::CredentialsBlob;

/// Who is driving this backend instance. Test clients skip request signing
/// so they can run against a local mock endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderClient {
    /// The real host orchestrator.
    Core,
    /// A test harness.
    Test,
}

/// A warehouse backend the host can construct and health-check. The
/// per-object-kind reconcile operations live on the backend's own type;
/// their state records differ per kind and per warehouse.
#[async_trait]
pub trait Provider {
    /// Instantiate a backend from its credentials blob. Validates that the
    /// required fields are present; does not touch the network.
    fn new(credentials: &CredentialsBlob, client: Option<ProviderClient>) -> Result<Box<Self>>;

    /// Check if the backend is properly set up and return the connection
    /// status (true for connected, false for not).
    async fn check(&self) -> bool;
}
