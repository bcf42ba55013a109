//! Stage reconciliation.
//!
//! Credentials are write-only: the catalog never echoes them back, so read
//! leaves the credentials field empty and only the integration-role fields
//! (aws_role, aws_external_id, snowflake_iam_user) are refreshed from
//! DESC STAGE output.

use tundra_core::schema::{AttributeKind, AttributeSpec};
use tundra_core::ReconcileError;

use crate::catalog;
use crate::exists::{object_exists, Existence, ObjectKind, Scope};
use crate::ident::{self, ObjectId};
use crate::stmt;
use crate::SnowflakeProvider;

/// Declared and observed stage attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageState {
    pub name: String,
    pub database: String,
    /// Defaults to PUBLIC when not declared.
    pub schema: String,
    pub url: String,
    /// Raw credentials clause body; mutually exclusive with `aws_role`.
    pub credentials: String,
    pub aws_role: String,
    /// Filled in on read.
    pub aws_external_id: String,
    /// Filled in on read.
    pub snowflake_iam_user: String,
}

/// The attribute surface stages expose to the host.
pub static STAGE_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec {
        name: "name",
        kind: AttributeKind::Required,
        force_new: false,
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
        kind: AttributeKind::Optional,
        force_new: true,
        default: Some("PUBLIC"),
        normalize: Some(ident::upper),
    },
    AttributeSpec {
        name: "url",
        kind: AttributeKind::Optional,
        force_new: true,
        default: None,
        normalize: Some(ident::lower),
    },
    AttributeSpec {
        name: "credentials",
        kind: AttributeKind::Optional,
        force_new: false,
        default: None,
        normalize: None,
    },
    AttributeSpec {
        name: "aws_role",
        kind: AttributeKind::Optional,
        force_new: false,
        default: None,
        normalize: None,
    },
    AttributeSpec {
        name: "aws_external_id",
        kind: AttributeKind::Computed,
        force_new: false,
        default: None,
        normalize: None,
    },
    AttributeSpec {
        name: "snowflake_iam_user",
        kind: AttributeKind::Computed,
        force_new: false,
        default: None,
        normalize: None,
    },
];

impl SnowflakeProvider {
    /// Create the stage and return its `DB.SCHEMA.NAME` identity.
    pub async fn create_stage(&self, desired: &StageState) -> Result<ObjectId, ReconcileError> {
        let mut desired = desired.clone();
        if desired.schema.is_empty() {
            desired.schema = "PUBLIC".to_owned();
        }
        let statement = stmt::create_stage(&desired)?;
        self.session().execute(&statement).await?;
        ObjectId::from_parts(&[&desired.database, &desired.schema, &desired.name])
    }

    /// Read the live stage behind `id` back into state shape.
    pub async fn read_stage(&self, id: &ObjectId) -> Result<StageState, ReconcileError> {
        let (database, schema, name) = (id.segment(0), id.segment(1), id.segment(2));
        let props = catalog::describe_stage(self.session(), database, schema, name).await?;
        Ok(StageState {
            name: name.to_owned(),
            database: database.to_owned(),
            schema: schema.to_owned(),
            url: props.url,
            credentials: String::new(),
            aws_role: props.aws_role,
            aws_external_id: props.aws_external_id,
            snowflake_iam_user: props.snowflake_iam_user,
        })
    }

    /// Drop the stage, verifying it still exists first.
    pub async fn delete_stage(&self, id: &ObjectId) -> Result<(), ReconcileError> {
        let (database, schema, name) = (id.segment(0), id.segment(1), id.segment(2));
        let scope = Scope::Schema(database.to_owned(), schema.to_owned());
        match object_exists(self.session(), ObjectKind::Stage, name, &scope).await? {
            Existence::Absent => Err(ReconcileError::NotFound {
                kind: "stage",
                name: id.to_string(),
            }),
            Existence::Unique => {
                self.session()
                    .execute(&stmt::drop_stage(database, schema, name)?)
                    .await?;
                Ok(())
            }
        }
    }

    /// Adopt an existing stage from an externally supplied id.
    pub async fn import_stage(
        &self,
        raw_id: &str,
    ) -> Result<(ObjectId, StageState), ReconcileError> {
        let id = ObjectId::parse(raw_id, 3)?;
        let state = self.read_stage(&id).await?;
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
    async fn create_defaults_the_schema_segment_to_public() {
        let session = Arc::new(MockSession::new());
        let provider = SnowflakeProvider::with_session(Box::new(session.clone()));
        let desired = StageState {
            name: "landing".to_owned(),
            database: "raw".to_owned(),
            ..Default::default()
        };
        let id = provider.create_stage(&desired).await.unwrap();
        assert_eq!(id.to_string(), "RAW.PUBLIC.LANDING");
        assert_eq!(session.executed(), vec!["CREATE STAGE RAW.PUBLIC.LANDING"]);
    }

    #[tokio::test]
    async fn read_refreshes_integration_fields_but_not_credentials() {
        let exists = QueryData {
            fields: vec!["name".to_owned()],
            rows: vec![vec!["LANDING".to_owned()]],
        };
        let desc = QueryData {
            fields: vec![
                "parent_property".to_owned(),
                "property".to_owned(),
                "property_type".to_owned(),
                "property_value".to_owned(),
                "property_default".to_owned(),
            ],
            rows: vec![
                vec![
                    "STAGE_LOCATION".to_owned(),
                    "URL".to_owned(),
                    "String".to_owned(),
                    "[\"s3://bucket/events\"]".to_owned(),
                    "".to_owned(),
                ],
                vec![
                    "STAGE_CREDENTIALS".to_owned(),
                    "AWS_EXTERNAL_ID".to_owned(),
                    "String".to_owned(),
                    "ext-1".to_owned(),
                    "".to_owned(),
                ],
            ],
        };
        let session = Arc::new(
            MockSession::new()
                .respond("SHOW STAGES LIKE 'LANDING'", exists)
                .respond("DESC STAGE", desc),
        );
        let provider = SnowflakeProvider::with_session(Box::new(session.clone()));
        let id = ObjectId::parse("RAW.PUBLIC.LANDING", 3).unwrap();
        let state = provider.read_stage(&id).await.unwrap();
        assert_eq!(state.url, "s3://bucket/events");
        assert_eq!(state.aws_external_id, "ext-1");
        assert!(state.credentials.is_empty());
    }
}
