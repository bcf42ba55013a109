//! The existence check run before any mutation.
//!
//! Before modifying any object we want to know that one and only one object
//! matches its name. Unquoted identifiers are case-insensitive, but quoting
//! makes them case-sensitive, so it is possible to issue
//!
//! ```sql
//! create database "foo";
//! create database "FOO";
//! ```
//!
//! and get two results for `show databases like 'foo'`. A multi-match is
//! never resolved automatically; it fails the operation before any statement
//! runs against the wrong object.

use std::fmt;

use tundra_core::ReconcileError;

use crate::ident::escape_literal;
use crate::session::Session;

/// What an existence probe found. More than one match is not a state; it is
/// an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Existence {
    Absent,
    Unique,
}

/// The catalog object kinds this backend manages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Database,
    Schema,
    Table,
    View,
    Pipe,
    Stage,
    User,
    Role,
}

impl ObjectKind {
    /// The plural keyword used in `SHOW` listings.
    pub fn plural(&self) -> &'static str {
        match self {
            ObjectKind::Database => "DATABASES",
            ObjectKind::Schema => "SCHEMAS",
            ObjectKind::Table => "TABLES",
            ObjectKind::View => "VIEWS",
            ObjectKind::Pipe => "PIPES",
            ObjectKind::Stage => "STAGES",
            ObjectKind::User => "USERS",
            ObjectKind::Role => "ROLES",
        }
    }

    /// The lower-case singular used in error messages.
    pub fn singular(&self) -> &'static str {
        match self {
            ObjectKind::Database => "database",
            ObjectKind::Schema => "schema",
            ObjectKind::Table => "table",
            ObjectKind::View => "view",
            ObjectKind::Pipe => "pipe",
            ObjectKind::Stage => "stage",
            ObjectKind::User => "user",
            ObjectKind::Role => "role",
        }
    }
}

/// The containing namespace a name lookup is qualified by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    Account,
    Database(String),
    Schema(String, String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Account => write!(f, "ACCOUNT"),
            Scope::Database(db) => write!(f, "{}", db),
            Scope::Schema(db, schema) => write!(f, "{}.{}", db, schema),
        }
    }
}

/// Probe for an object by exact (normalized) name within a scope.
///
/// Zero matching rows is [`Existence::Absent`], one is
/// [`Existence::Unique`], and anything more fails with
/// [`ReconcileError::Ambiguous`].
pub async fn object_exists(
    session: &dyn Session,
    kind: ObjectKind,
    name: &str,
    scope: &Scope,
) -> Result<Existence, ReconcileError> {
    let statement = format!(
        "SHOW {} LIKE '{}' IN {}",
        kind.plural(),
        escape_literal(name),
        scope
    );
    let data = session.query(&statement).await?;
    match data.rows.len() {
        0 => Ok(Existence::Absent),
        1 => Ok(Existence::Unique),
        _ => Err(ReconcileError::Ambiguous { statement }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::mock::MockSession;
    use crate::session::QueryData;

    fn show_rows(n: usize) -> QueryData {
        QueryData {
            fields: vec!["name".to_owned()],
            rows: (0..n).map(|i| vec![format!("OBJ{}", i)]).collect(),
        }
    }

    #[tokio::test]
    async fn zero_rows_is_absent() {
        let session = MockSession::new().respond("SHOW DATABASES LIKE", show_rows(0));
        let found = object_exists(&session, ObjectKind::Database, "REPORTS", &Scope::Account)
            .await
            .unwrap();
        assert_eq!(found, Existence::Absent);
    }

    #[tokio::test]
    async fn one_row_is_unique() {
        let session = MockSession::new().respond("SHOW TABLES LIKE", show_rows(1));
        let found = object_exists(
            &session,
            ObjectKind::Table,
            "EVENTS",
            &Scope::Schema("ANALYTICS".to_owned(), "PUBLIC".to_owned()),
        )
        .await
        .unwrap();
        assert_eq!(found, Existence::Unique);
        assert_eq!(
            session.statements(),
            vec!["SHOW TABLES LIKE 'EVENTS' IN ANALYTICS.PUBLIC"]
        );
    }

    #[tokio::test]
    async fn two_rows_is_ambiguous() {
        let session = MockSession::new().respond("SHOW SCHEMAS LIKE", show_rows(2));
        let err = object_exists(
            &session,
            ObjectKind::Schema,
            "FOO",
            &Scope::Database("ANALYTICS".to_owned()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ReconcileError::Ambiguous { .. }));
    }

    #[tokio::test]
    async fn quotes_in_names_are_escaped() {
        let session = MockSession::new().respond("SHOW USERS LIKE", show_rows(0));
        object_exists(&session, ObjectKind::User, "O'BRIEN", &Scope::Account)
            .await
            .unwrap();
        assert_eq!(
            session.statements(),
            vec!["SHOW USERS LIKE 'O''BRIEN' IN ACCOUNT"]
        );
    }
}
