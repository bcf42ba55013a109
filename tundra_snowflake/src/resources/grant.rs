//! Privilege-grant reconciliation for tables and views.
//!
//! A grant's identity is the composite `GRANTEE.DB.SCHEMA.OBJECT.PRIV...`.
//! Create issues one GRANT listing every privilege; delete issues one
//! REVOKE the same way. There is no update: the host models privilege-set
//! changes as revoke-then-grant through its own diffing.

use tundra_core::schema::{AttributeKind, AttributeSpec};
use tundra_core::ReconcileError;

use crate::catalog;
use crate::ident::{self, normalize_ident, normalize_privilege, ObjectId};
use crate::row_types::SecurableKind;
use crate::stmt;
use crate::SnowflakeProvider;

/// The role or share receiving the privileges. Exactly one applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Grantee {
    Role(String),
    Share(String),
}

impl Grantee {
    /// The grantee name.
    pub fn name(&self) -> &str {
        match self {
            Grantee::Role(name) | Grantee::Share(name) => name,
        }
    }

    /// The keyword rendered into GRANT/REVOKE text.
    pub fn keyword(&self) -> &'static str {
        match self {
            Grantee::Role(_) => "ROLE",
            Grantee::Share(_) => "SHARE",
        }
    }
}

impl Default for Grantee {
    fn default() -> Self {
        Grantee::Role(String::new())
    }
}

/// Declared and observed grant attributes. The securable kind (table or
/// view) is carried by the operation, mirroring the split resource surface
/// the host sees.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrantState {
    pub database: String,
    pub schema: String,
    /// Object name, or the literal `ALL` for every object of the kind in
    /// the schema.
    pub object: String,
    pub privileges: Vec<String>,
    pub grantee: Grantee,
}

/// The attribute surface grants expose to the host. Everything is
/// force-new: a changed grant is a different grant.
pub static GRANT_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec {
        name: "object",
        kind: AttributeKind::Required,
        force_new: true,
        default: None,
        normalize: Some(ident::upper),
    },
    AttributeSpec {
        name: "database",
        kind: AttributeKind::Required,
        force_new: true,
        default: None,
        normalize: Some(ident::upper),
    },
    AttributeSpec {
        name: "schema",
        kind: AttributeKind::Required,
        force_new: true,
        default: None,
        normalize: Some(ident::upper),
    },
    AttributeSpec {
        name: "privileges",
        kind: AttributeKind::Required,
        force_new: true,
        default: None,
        normalize: Some(ident::upper),
    },
    AttributeSpec {
        name: "grantee_role",
        kind: AttributeKind::Optional,
        force_new: true,
        default: None,
        normalize: Some(ident::upper),
    },
    AttributeSpec {
        name: "grantee_share",
        kind: AttributeKind::Optional,
        force_new: true,
        default: None,
        normalize: Some(ident::upper),
    },
];

/// Derive the composite identity for a grant.
fn grant_id(desired: &GrantState) -> Result<ObjectId, ReconcileError> {
    if desired.privileges.is_empty() {
        return Err(ReconcileError::Validation(
            "a grant needs at least one privilege".to_owned(),
        ));
    }
    let mut segments = vec![
        normalize_ident(desired.grantee.name())?,
        normalize_ident(&desired.database)?,
        normalize_ident(&desired.schema)?,
        normalize_ident(&desired.object)?,
    ];
    for privilege in &desired.privileges {
        segments.push(normalize_privilege(privilege)?);
    }
    Ok(ObjectId::from_normalized(segments))
}

/// Parse an externally supplied grant id back into its parts.
fn parse_grant_id(raw: &str) -> Result<(ObjectId, GrantState), ReconcileError> {
    let parts: Vec<&str> = raw.split('.').collect();
    if parts.len() < 5 {
        return Err(ReconcileError::Validation(format!(
            "grant id \"{}\" has {} segments, expected at least 5",
            raw,
            parts.len()
        )));
    }
    let mut segments = vec![
        normalize_ident(parts[0])?,
        normalize_ident(parts[1])?,
        normalize_ident(parts[2])?,
        normalize_ident(parts[3])?,
    ];
    for privilege in &parts[4..] {
        segments.push(normalize_privilege(privilege)?);
    }
    let state = GrantState {
        database: segments[1].clone(),
        schema: segments[2].clone(),
        object: segments[3].clone(),
        privileges: segments[4..].to_vec(),
        // The id does not record the grantee class; grants read back from
        // the catalog correct this from the granted_to column.
        grantee: Grantee::Role(segments[0].clone()),
    };
    Ok((ObjectId::from_normalized(segments), state))
}

impl SnowflakeProvider {
    async fn create_grant(
        &self,
        kind: SecurableKind,
        desired: &GrantState,
    ) -> Result<ObjectId, ReconcileError> {
        let id = grant_id(desired)?;
        let statement = stmt::grant(kind, desired)?;
        self.session().execute(&statement).await?;
        Ok(id)
    }

    async fn read_grant(
        &self,
        kind: SecurableKind,
        id: &ObjectId,
    ) -> Result<GrantState, ReconcileError> {
        let (_, parsed) = parse_grant_id(&id.to_string())?;
        // The ALL form fans out over every object in the schema; there is no
        // single catalog object to list, so the declared shape stands.
        if parsed.object == "ALL" {
            return Ok(parsed);
        }
        let rows = catalog::show_grants_on(
            self.session(),
            kind,
            &parsed.database,
            &parsed.schema,
            &parsed.object,
        )
        .await?;
        let grantee_name = parsed.grantee.name();
        let matching: Vec<_> = rows
            .iter()
            .filter(|row| row.grantee_name == grantee_name)
            .collect();
        match matching.first() {
            None => Err(ReconcileError::NotFound {
                kind: "grant",
                name: id.to_string(),
            }),
            Some(first) => {
                let grantee = if first.granted_to == "SHARE" {
                    Grantee::Share(grantee_name.to_owned())
                } else {
                    Grantee::Role(grantee_name.to_owned())
                };
                Ok(GrantState {
                    privileges: matching.iter().map(|row| row.privilege.clone()).collect(),
                    grantee,
                    ..parsed
                })
            }
        }
    }

    async fn delete_grant(
        &self,
        kind: SecurableKind,
        desired: &GrantState,
    ) -> Result<(), ReconcileError> {
        let statement = stmt::revoke(kind, desired)?;
        self.session().execute(&statement).await?;
        Ok(())
    }

    async fn import_grant(
        &self,
        kind: SecurableKind,
        raw_id: &str,
    ) -> Result<(ObjectId, GrantState), ReconcileError> {
        let (id, _) = parse_grant_id(raw_id)?;
        let state = self.read_grant(kind, &id).await?;
        Ok((id, state))
    }

    /// Grant privileges on a table (or on all tables in a schema) and
    /// return the composite identity.
    pub async fn create_table_grant(
        &self,
        desired: &GrantState,
    ) -> Result<ObjectId, ReconcileError> {
        self.create_grant(SecurableKind::Table, desired).await
    }

    /// Read the live privilege set behind a table-grant identity.
    pub async fn read_table_grant(&self, id: &ObjectId) -> Result<GrantState, ReconcileError> {
        self.read_grant(SecurableKind::Table, id).await
    }

    /// Revoke the privileges recorded in the grant, in one statement.
    pub async fn delete_table_grant(&self, desired: &GrantState) -> Result<(), ReconcileError> {
        self.delete_grant(SecurableKind::Table, desired).await
    }

    /// Adopt an existing table grant from an externally supplied id.
    pub async fn import_table_grant(
        &self,
        raw_id: &str,
    ) -> Result<(ObjectId, GrantState), ReconcileError> {
        self.import_grant(SecurableKind::Table, raw_id).await
    }

    /// Grant privileges on a view (or on all views in a schema) and return
    /// the composite identity.
    pub async fn create_view_grant(
        &self,
        desired: &GrantState,
    ) -> Result<ObjectId, ReconcileError> {
        self.create_grant(SecurableKind::View, desired).await
    }

    /// Read the live privilege set behind a view-grant identity.
    pub async fn read_view_grant(&self, id: &ObjectId) -> Result<GrantState, ReconcileError> {
        self.read_grant(SecurableKind::View, id).await
    }

    /// Revoke the privileges recorded in the grant, in one statement.
    pub async fn delete_view_grant(&self, desired: &GrantState) -> Result<(), ReconcileError> {
        self.delete_grant(SecurableKind::View, desired).await
    }

    /// Adopt an existing view grant from an externally supplied id.
    pub async fn import_view_grant(
        &self,
        raw_id: &str,
    ) -> Result<(ObjectId, GrantState), ReconcileError> {
        self.import_grant(SecurableKind::View, raw_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::mock::MockSession;
    use crate::session::QueryData;

    fn state() -> GrantState {
        GrantState {
            database: "analytics".to_owned(),
            schema: "public".to_owned(),
            object: "events".to_owned(),
            privileges: vec!["select".to_owned(), "insert".to_owned()],
            grantee: Grantee::Role("loader".to_owned()),
        }
    }

    #[tokio::test]
    async fn create_issues_one_grant_and_derives_the_composite_id() {
        let session = Arc::new(MockSession::new());
        let provider = SnowflakeProvider::with_session(Box::new(session.clone()));
        let id = provider.create_table_grant(&state()).await.unwrap();
        assert_eq!(id.to_string(), "LOADER.ANALYTICS.PUBLIC.EVENTS.SELECT.INSERT");
        assert_eq!(
            session.executed(),
            vec!["GRANT SELECT, INSERT ON ANALYTICS.PUBLIC.EVENTS TO ROLE LOADER"]
        );
    }

    #[tokio::test]
    async fn delete_issues_one_revoke() {
        let session = Arc::new(MockSession::new());
        let provider = SnowflakeProvider::with_session(Box::new(session.clone()));
        provider.delete_table_grant(&state()).await.unwrap();
        assert_eq!(
            session.executed(),
            vec!["REVOKE SELECT, INSERT ON ANALYTICS.PUBLIC.EVENTS FROM ROLE LOADER"]
        );
    }

    #[tokio::test]
    async fn read_filters_the_listing_by_grantee() {
        let listing = QueryData {
            fields: vec![
                "created_on".to_owned(),
                "privilege".to_owned(),
                "granted_on".to_owned(),
                "name".to_owned(),
                "granted_to".to_owned(),
                "grantee_name".to_owned(),
                "grant_option".to_owned(),
                "granted_by".to_owned(),
            ],
            rows: vec![
                vec![
                    "2024-01-01".to_owned(),
                    "SELECT".to_owned(),
                    "TABLE".to_owned(),
                    "ANALYTICS.PUBLIC.EVENTS".to_owned(),
                    "ROLE".to_owned(),
                    "LOADER".to_owned(),
                    "false".to_owned(),
                    "SYSADMIN".to_owned(),
                ],
                vec![
                    "2024-01-01".to_owned(),
                    "SELECT".to_owned(),
                    "TABLE".to_owned(),
                    "ANALYTICS.PUBLIC.EVENTS".to_owned(),
                    "ROLE".to_owned(),
                    "ANALYST".to_owned(),
                    "false".to_owned(),
                    "SYSADMIN".to_owned(),
                ],
            ],
        };
        let session = Arc::new(MockSession::new().respond("SHOW GRANTS ON TABLE", listing));
        let provider = SnowflakeProvider::with_session(Box::new(session.clone()));
        let id = ObjectId::from_normalized(vec![
            "LOADER".to_owned(),
            "ANALYTICS".to_owned(),
            "PUBLIC".to_owned(),
            "EVENTS".to_owned(),
            "SELECT".to_owned(),
        ]);
        let live = provider.read_table_grant(&id).await.unwrap();
        assert_eq!(live.privileges, vec!["SELECT"]);
        assert_eq!(live.grantee, Grantee::Role("LOADER".to_owned()));
    }

    #[tokio::test]
    async fn all_grants_read_back_from_their_id_alone() {
        let session = Arc::new(MockSession::new());
        let provider = SnowflakeProvider::with_session(Box::new(session.clone()));
        let (_, state) = provider
            .import_table_grant("loader.analytics.public.all.select")
            .await
            .unwrap();
        assert_eq!(state.object, "ALL");
        assert_eq!(state.privileges, vec!["SELECT"]);
        assert!(session.statements().is_empty());
    }

    #[test]
    fn short_grant_ids_are_rejected() {
        assert!(parse_grant_id("LOADER.DB.SCHEMA.TABLE").is_err());
    }
}
