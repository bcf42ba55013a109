//! View reconciliation.
//!
//! Every view attribute is force-new; there is no in-place update. The
//! declared definition may carry its own `create view ... as` prefix (as
//! pasted from SHOW output); the builder validates that the embedded name
//! matches the declared location and strips the prefix, and read strips it
//! symmetrically so definitions compare cleanly.

use tundra_core::schema::{AttributeKind, AttributeSpec};
use tundra_core::ReconcileError;

use crate::catalog;
use crate::exists::{object_exists, Existence, ObjectKind, Scope};
use crate::ident::{self, ObjectId};
use crate::stmt::{self, strip_view_prefix};
use crate::SnowflakeProvider;

/// Declared and observed view attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub name: String,
    pub database: String,
    pub schema: String,
    /// The SELECT body, without any `create view` prefix.
    pub view_definition: String,
    pub comment: String,
    pub secure: bool,
}

/// The attribute surface views expose to the host.
pub static VIEW_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec {
        name: "name",
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
        name: "view_definition",
        kind: AttributeKind::Required,
        force_new: true,
        default: None,
        normalize: Some(normalize_definition),
    },
    AttributeSpec {
        name: "comment",
        kind: AttributeKind::Optional,
        force_new: true,
        default: None,
        normalize: None,
    },
    AttributeSpec {
        name: "secure",
        kind: AttributeKind::Optional,
        force_new: true,
        default: Some("false"),
        normalize: None,
    },
];

fn normalize_definition(raw: &str) -> String {
    strip_view_prefix(raw).to_owned()
}

impl SnowflakeProvider {
    /// Create the view and return its `DB.SCHEMA.NAME` identity.
    pub async fn create_view(&self, desired: &ViewState) -> Result<ObjectId, ReconcileError> {
        let statement = stmt::create_view(desired)?;
        self.session().execute(&statement).await?;
        ObjectId::from_parts(&[&desired.database, &desired.schema, &desired.name])
    }

    /// Read the live view behind `id` back into state shape.
    pub async fn read_view(&self, id: &ObjectId) -> Result<ViewState, ReconcileError> {
        let (database, schema, name) = (id.segment(0), id.segment(1), id.segment(2));
        let row = catalog::read_view(self.session(), database, schema, name).await?;
        Ok(ViewState {
            name: row.table_name,
            database: row.table_catalog,
            schema: row.table_schema,
            view_definition: strip_view_prefix(&row.view_definition).to_owned(),
            comment: row.comment,
            secure: row.is_secure == "YES",
        })
    }

    /// Drop the view, verifying it still exists first.
    pub async fn delete_view(&self, id: &ObjectId) -> Result<(), ReconcileError> {
        let (database, schema, name) = (id.segment(0), id.segment(1), id.segment(2));
        let scope = Scope::Schema(database.to_owned(), schema.to_owned());
        match object_exists(self.session(), ObjectKind::View, name, &scope).await? {
            Existence::Absent => Err(ReconcileError::NotFound {
                kind: "view",
                name: id.to_string(),
            }),
            Existence::Unique => {
                self.session()
                    .execute(&stmt::drop_view(database, schema, name)?)
                    .await?;
                Ok(())
            }
        }
    }

    /// Adopt an existing view from an externally supplied id.
    pub async fn import_view(
        &self,
        raw_id: &str,
    ) -> Result<(ObjectId, ViewState), ReconcileError> {
        let id = ObjectId::parse(raw_id, 3)?;
        let state = self.read_view(&id).await?;
        Ok((id, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::mock::MockSession;
    use crate::session::QueryData;

    #[tokio::test]
    async fn read_strips_the_create_prefix_and_maps_secure() {
        let exists = QueryData {
            fields: vec!["name".to_owned()],
            rows: vec![vec!["DAILY".to_owned()]],
        };
        let listing = QueryData {
            fields: vec![
                "TABLE_CATALOG".to_owned(),
                "TABLE_SCHEMA".to_owned(),
                "TABLE_NAME".to_owned(),
                "VIEW_DEFINITION".to_owned(),
                "IS_SECURE".to_owned(),
                "COMMENT".to_owned(),
            ],
            rows: vec![vec![
                "ANALYTICS".to_owned(),
                "PUBLIC".to_owned(),
                "DAILY".to_owned(),
                "create view analytics.public.daily as\nselect 1".to_owned(),
                "YES".to_owned(),
                "".to_owned(),
            ]],
        };
        let session = Arc::new(
            MockSession::new()
                .respond("SHOW VIEWS LIKE 'DAILY'", exists)
                .respond("information_schema.views", listing),
        );
        let provider = SnowflakeProvider::with_session(Box::new(session.clone()));
        let id = ObjectId::parse("ANALYTICS.PUBLIC.DAILY", 3).unwrap();
        let state = provider.read_view(&id).await.unwrap();
        assert_eq!(state.view_definition, "select 1");
        assert!(state.secure);
    }
}
