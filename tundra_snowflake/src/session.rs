//! The execution seam between reconcilers and the warehouse.
//!
//! Reconcilers and catalog readers only ever need two primitives: run a
//! statement, or run a statement and get tabular rows back. The session
//! object carrying them is passed explicitly into every call; there is no
//! shared global handle. Timeouts, cancellation, and retry live in the
//! session implementation supplied by the host, never here.

use anyhow::Result;
use async_trait::async_trait;

/// Tabular output of one query: column names plus stringified row values,
/// in server order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryData {
    pub fields: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A single open Snowflake session.
#[async_trait]
pub trait Session: Send + Sync {
    /// Execute a statement, dropping any result.
    ///
    /// Used for statements that update remote state; a non-error return
    /// means the statement was accepted.
    async fn execute(&self, sql: &str) -> Result<()>;

    /// Execute a statement and return its result rows.
    async fn query(&self, sql: &str) -> Result<QueryData>;
}

#[async_trait]
impl<S: Session + ?Sized> Session for std::sync::Arc<S> {
    async fn execute(&self, sql: &str) -> Result<()> {
        (**self).execute(sql).await
    }

    async fn query(&self, sql: &str) -> Result<QueryData> {
        (**self).query(sql).await
    }
}
