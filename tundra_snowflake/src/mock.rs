//! A scriptable in-memory [`Session`] for tests.
//!
//! Canned query responses are matched by substring against the statement
//! text; the first registered match wins. Statements with no registered
//! response return an empty row set, which reads as "no matching objects"
//! to callers doing catalog lookups. Every statement sent through the
//! session is recorded so tests can assert on exact statement text and
//! ordering.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::session::{QueryData, Session};

/// Scripted stand-in for a live Snowflake session.
#[derive(Default)]
pub struct MockSession {
    log: Mutex<Vec<String>>,
    executed: Mutex<Vec<String>>,
    responses: Mutex<Vec<(String, QueryData)>>,
    execute_failures: Mutex<Vec<String>>,
    query_failures: Mutex<Vec<String>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to any query whose text contains `needle` with `data`.
    pub fn respond(self, needle: &str, data: QueryData) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push((needle.to_owned(), data));
        self
    }

    /// Fail any executed statement whose text contains `needle`.
    pub fn fail_execute(self, needle: &str) -> Self {
        self.execute_failures.lock().unwrap().push(needle.to_owned());
        self
    }

    /// Fail any query whose text contains `needle`.
    pub fn fail_query(self, needle: &str) -> Self {
        self.query_failures.lock().unwrap().push(needle.to_owned());
        self
    }

    /// Every statement sent through the session, in order.
    pub fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Only the statements sent through [`Session::execute`], the mutating
    /// ones.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Session for MockSession {
    async fn execute(&self, sql: &str) -> Result<()> {
        self.log.lock().unwrap().push(sql.to_owned());
        if self
            .execute_failures
            .lock()
            .unwrap()
            .iter()
            .any(|needle| sql.contains(needle.as_str()))
        {
            return Err(anyhow!("scripted failure for \"{}\"", sql));
        }
        self.executed.lock().unwrap().push(sql.to_owned());
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<QueryData> {
        self.log.lock().unwrap().push(sql.to_owned());
        if self
            .query_failures
            .lock()
            .unwrap()
            .iter()
            .any(|needle| sql.contains(needle.as_str()))
        {
            return Err(anyhow!("scripted failure for \"{}\"", sql));
        }
        let response = self
            .responses
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, data)| data.clone())
            .unwrap_or_default();
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unmatched_queries_return_no_rows() {
        let session = MockSession::new();
        let data = session.query("SHOW DATABASES LIKE 'X'").await.unwrap();
        assert!(data.rows.is_empty());
    }

    #[tokio::test]
    async fn scripted_execute_failure_is_not_recorded_as_applied() {
        let session = MockSession::new().fail_execute("SET COMMENT");
        session.execute("CREATE DATABASE D").await.unwrap();
        assert!(session
            .execute("ALTER DATABASE D SET COMMENT = 'x'")
            .await
            .is_err());
        assert_eq!(session.executed(), vec!["CREATE DATABASE D"]);
        assert_eq!(session.statements().len(), 2);
    }
}
