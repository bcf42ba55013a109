//! Pipe reconciliation.
//!
//! The copy statement and ingestion mode are baked into the pipe at create
//! time; comment is the one attribute that can change in place. Whether the
//! pipe auto-ingests is derived on read from the presence of a notification
//! channel.

use tundra_core::schema::{AttributeKind, AttributeSpec};
use tundra_core::ReconcileError;

use crate::catalog;
use crate::exists::{object_exists, Existence, ObjectKind, Scope};
use crate::ident::{self, ObjectId};
use crate::stmt;
use crate::SnowflakeProvider;

/// Declared and observed pipe attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipeState {
    pub name: String,
    pub database: String,
    pub schema: String,
    pub comment: String,
    /// The COPY statement the pipe runs.
    pub copy_statement: String,
    pub auto_ingest: bool,
    /// Filled in on read.
    pub notification_channel: String,
    /// Filled in on read.
    pub owner: String,
}

/// The attribute surface pipes expose to the host.
pub static PIPE_ATTRIBUTES: &[AttributeSpec] = &[
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
        name: "comment",
        kind: AttributeKind::Optional,
        force_new: false,
        default: None,
        normalize: None,
    },
    AttributeSpec {
        name: "copy_statement",
        kind: AttributeKind::Required,
        force_new: true,
        default: None,
        normalize: Some(ident::trim),
    },
    AttributeSpec {
        name: "auto_ingest",
        kind: AttributeKind::Optional,
        force_new: true,
        default: Some("false"),
        normalize: None,
    },
    AttributeSpec {
        name: "notification_channel",
        kind: AttributeKind::Computed,
        force_new: false,
        default: None,
        normalize: None,
    },
    AttributeSpec {
        name: "owner",
        kind: AttributeKind::Computed,
        force_new: false,
        default: None,
        normalize: None,
    },
];

impl SnowflakeProvider {
    /// Create the pipe and return its `DB.SCHEMA.NAME` identity.
    pub async fn create_pipe(&self, desired: &PipeState) -> Result<ObjectId, ReconcileError> {
        let statement = stmt::create_pipe(desired)?;
        self.session().execute(&statement).await?;
        ObjectId::from_parts(&[&desired.database, &desired.schema, &desired.name])
    }

    /// Read the live pipe behind `id` back into state shape.
    pub async fn read_pipe(&self, id: &ObjectId) -> Result<PipeState, ReconcileError> {
        let (database, schema, name) = (id.segment(0), id.segment(1), id.segment(2));
        let row = catalog::show_pipe(self.session(), database, schema, name).await?;
        Ok(PipeState {
            name: row.name,
            database: row.database_name,
            schema: row.schema_name,
            comment: row.comment,
            copy_statement: row.definition.trim().to_owned(),
            auto_ingest: !row.notification_channel.is_empty(),
            notification_channel: row.notification_channel,
            owner: row.owner,
        })
    }

    /// Comment is the only in-place pipe mutation.
    pub async fn update_pipe(
        &self,
        id: &ObjectId,
        prior: &mut PipeState,
        desired: &PipeState,
    ) -> Result<(), ReconcileError> {
        let (database, schema, name) = (id.segment(0), id.segment(1), id.segment(2));
        let scope = Scope::Schema(database.to_owned(), schema.to_owned());
        match object_exists(self.session(), ObjectKind::Pipe, name, &scope).await? {
            Existence::Absent => {
                return Err(ReconcileError::NotFound {
                    kind: "pipe",
                    name: id.to_string(),
                })
            }
            Existence::Unique => {}
        }
        if prior.comment != desired.comment {
            self.session()
                .execute(&stmt::set_pipe_comment(
                    database,
                    schema,
                    name,
                    &desired.comment,
                )?)
                .await?;
            prior.comment = desired.comment.clone();
        }
        Ok(())
    }

    /// Drop the pipe, verifying it still exists first.
    pub async fn delete_pipe(&self, id: &ObjectId) -> Result<(), ReconcileError> {
        let (database, schema, name) = (id.segment(0), id.segment(1), id.segment(2));
        let scope = Scope::Schema(database.to_owned(), schema.to_owned());
        match object_exists(self.session(), ObjectKind::Pipe, name, &scope).await? {
            Existence::Absent => Err(ReconcileError::NotFound {
                kind: "pipe",
                name: id.to_string(),
            }),
            Existence::Unique => {
                self.session()
                    .execute(&stmt::drop_pipe(database, schema, name)?)
                    .await?;
                Ok(())
            }
        }
    }

    /// Adopt an existing pipe from an externally supplied id.
    pub async fn import_pipe(
        &self,
        raw_id: &str,
    ) -> Result<(ObjectId, PipeState), ReconcileError> {
        let id = ObjectId::parse(raw_id, 3)?;
        let state = self.read_pipe(&id).await?;
        Ok((id, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::mock::MockSession;
    use crate::session::QueryData;

    fn pipe_listing(notification_channel: &str) -> QueryData {
        QueryData {
            fields: vec![
                "created_on".to_owned(),
                "name".to_owned(),
                "database_name".to_owned(),
                "schema_name".to_owned(),
                "definition".to_owned(),
                "owner".to_owned(),
                "notification_channel".to_owned(),
                "comment".to_owned(),
            ],
            rows: vec![vec![
                "2024-01-01".to_owned(),
                "LOADER".to_owned(),
                "RAW".to_owned(),
                "PUBLIC".to_owned(),
                "  copy into raw.public.t from @raw.public.landing ".to_owned(),
                "SYSADMIN".to_owned(),
                notification_channel.to_owned(),
                "".to_owned(),
            ]],
        }
    }

    #[tokio::test]
    async fn auto_ingest_is_derived_from_the_notification_channel() {
        let session = Arc::new(
            MockSession::new()
                .respond("SHOW PIPES LIKE 'LOADER'", pipe_listing("arn:aws:sqs:queue")),
        );
        let provider = SnowflakeProvider::with_session(Box::new(session.clone()));
        let id = ObjectId::parse("RAW.PUBLIC.LOADER", 3).unwrap();
        let state = provider.read_pipe(&id).await.unwrap();
        assert!(state.auto_ingest);
        assert_eq!(
            state.copy_statement,
            "copy into raw.public.t from @raw.public.landing"
        );
    }
}
