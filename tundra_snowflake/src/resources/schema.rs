//! Schema reconciliation.

use tundra_core::schema::{AttributeKind, AttributeSpec};
use tundra_core::ReconcileError;

use crate::catalog;
use crate::exists::{object_exists, Existence, ObjectKind, Scope};
use crate::ident::{self, normalize_ident, ObjectId};
use crate::stmt;
use crate::SnowflakeProvider;

use super::parse_count;

/// Declared and observed schema attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaState {
    pub name: String,
    pub database: String,
    pub comment: String,
    pub transient: bool,
    pub retention_time: i64,
    /// Filled in on read.
    pub owner: String,
}

/// The attribute surface schemas expose to the host.
pub static SCHEMA_ATTRIBUTES: &[AttributeSpec] = &[
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
        name: "owner",
        kind: AttributeKind::Computed,
        force_new: false,
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
        name: "transient",
        kind: AttributeKind::Optional,
        force_new: true,
        default: Some("false"),
        normalize: None,
    },
    AttributeSpec {
        name: "retention_time",
        kind: AttributeKind::Optional,
        force_new: false,
        default: Some("1"),
        normalize: None,
    },
];

impl SnowflakeProvider {
    /// Create the schema and return its `DB.NAME` identity.
    pub async fn create_schema(&self, desired: &SchemaState) -> Result<ObjectId, ReconcileError> {
        let statement = stmt::create_schema(desired)?;
        self.session().execute(&statement).await?;
        ObjectId::from_parts(&[&desired.database, &desired.name])
    }

    /// Read the live schema behind `id` back into state shape.
    pub async fn read_schema(&self, id: &ObjectId) -> Result<SchemaState, ReconcileError> {
        let row = catalog::show_schema(self.session(), id.segment(0), id.segment(1)).await?;
        Ok(SchemaState {
            name: row.name,
            database: row.database_name,
            comment: row.comment,
            transient: row.options == "TRANSIENT",
            retention_time: parse_count(&row.retention_time, "retention time")?,
            owner: row.owner,
        })
    }

    /// Look a schema up by location without a pre-existing identity. This is
    /// the read-only discovery path.
    pub async fn lookup_schema(
        &self,
        database: &str,
        name: &str,
    ) -> Result<(ObjectId, SchemaState), ReconcileError> {
        let id = ObjectId::from_parts(&[database, name])?;
        let state = self.read_schema(&id).await?;
        Ok((id, state))
    }

    /// Apply the changed attributes, one statement each, rename first.
    pub async fn update_schema(
        &self,
        id: &mut ObjectId,
        prior: &mut SchemaState,
        desired: &SchemaState,
    ) -> Result<(), ReconcileError> {
        let database = id.segment(0).to_owned();
        let current = id.segment(1).to_owned();
        let scope = Scope::Database(database.clone());
        match object_exists(self.session(), ObjectKind::Schema, &current, &scope).await? {
            Existence::Absent => {
                return Err(ReconcileError::NotFound {
                    kind: "schema",
                    name: id.to_string(),
                })
            }
            Existence::Unique => {}
        }

        let target = normalize_ident(&desired.name)?;
        if target != current {
            // Check that the rename target does not exist.
            if let Existence::Unique =
                object_exists(self.session(), ObjectKind::Schema, &target, &scope).await?
            {
                return Err(ReconcileError::Conflict {
                    from: id.to_string(),
                    to: format!("{}.{}", database, target),
                });
            }
            self.session()
                .execute(&stmt::rename_schema(&database, &current, &target)?)
                .await?;
            *id = ObjectId::from_parts(&[&database, &target])?;
            prior.name = target;
        }
        if prior.comment != desired.comment {
            self.session()
                .execute(&stmt::set_schema_comment(
                    &database,
                    id.segment(1),
                    &desired.comment,
                )?)
                .await?;
            prior.comment = desired.comment.clone();
        }
        if prior.retention_time != desired.retention_time {
            self.session()
                .execute(&stmt::set_schema_retention(
                    &database,
                    id.segment(1),
                    desired.retention_time,
                )?)
                .await?;
            prior.retention_time = desired.retention_time;
        }
        Ok(())
    }

    /// Drop the schema, verifying it still exists first.
    pub async fn delete_schema(&self, id: &ObjectId) -> Result<(), ReconcileError> {
        let database = id.segment(0);
        let name = id.segment(1);
        let scope = Scope::Database(database.to_owned());
        match object_exists(self.session(), ObjectKind::Schema, name, &scope).await? {
            Existence::Absent => Err(ReconcileError::NotFound {
                kind: "schema",
                name: id.to_string(),
            }),
            Existence::Unique => {
                self.session()
                    .execute(&stmt::drop_schema(database, name)?)
                    .await?;
                Ok(())
            }
        }
    }

    /// Adopt an existing schema from an externally supplied `DB.NAME` id.
    pub async fn import_schema(
        &self,
        raw_id: &str,
    ) -> Result<(ObjectId, SchemaState), ReconcileError> {
        let id = ObjectId::parse(raw_id, 2)?;
        let state = self.read_schema(&id).await?;
        Ok((id, state))
    }
}
