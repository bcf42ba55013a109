//! Database reconciliation.

use tundra_core::schema::{AttributeKind, AttributeSpec};
use tundra_core::ReconcileError;

use crate::catalog;
use crate::exists::{object_exists, Existence, ObjectKind, Scope};
use crate::ident::{self, normalize_ident, ObjectId};
use crate::stmt;
use crate::SnowflakeProvider;

use super::parse_count;

/// Declared and observed database attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatabaseState {
    pub name: String,
    pub comment: String,
    /// Transient databases skip fail-safe storage. Changing this replaces
    /// the database.
    pub transient: bool,
    pub retention_time: i64,
    /// Filled in on read.
    pub owner: String,
}

/// The attribute surface databases expose to the host.
pub static DATABASE_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec {
        name: "name",
        kind: AttributeKind::Required,
        force_new: false,
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
        default: Some("0"),
        normalize: None,
    },
];

impl SnowflakeProvider {
    /// Create the database and return its durable identity.
    pub async fn create_database(
        &self,
        desired: &DatabaseState,
    ) -> Result<ObjectId, ReconcileError> {
        let statement = stmt::create_database(desired)?;
        self.session().execute(&statement).await?;
        ObjectId::from_parts(&[&desired.name])
    }

    /// Read the live database behind `id` back into state shape.
    pub async fn read_database(&self, id: &ObjectId) -> Result<DatabaseState, ReconcileError> {
        let row = catalog::show_database(self.session(), id.segment(0)).await?;
        Ok(DatabaseState {
            name: row.name,
            comment: row.comment,
            transient: row.options == "TRANSIENT",
            retention_time: parse_count(&row.retention_time, "retention time")?,
            owner: row.owner,
        })
    }

    /// Apply the changed attributes, one statement each. Rename runs first
    /// and re-points `id`; the remaining statements address the new name.
    pub async fn update_database(
        &self,
        id: &mut ObjectId,
        prior: &mut DatabaseState,
        desired: &DatabaseState,
    ) -> Result<(), ReconcileError> {
        let current = id.segment(0).to_owned();
        match object_exists(self.session(), ObjectKind::Database, &current, &Scope::Account)
            .await?
        {
            Existence::Absent => {
                return Err(ReconcileError::NotFound {
                    kind: "database",
                    name: current,
                })
            }
            Existence::Unique => {}
        }

        let target = normalize_ident(&desired.name)?;
        if target != current {
            // Check that the rename target does not exist.
            if let Existence::Unique =
                object_exists(self.session(), ObjectKind::Database, &target, &Scope::Account)
                    .await?
            {
                return Err(ReconcileError::Conflict {
                    from: current,
                    to: target,
                });
            }
            self.session()
                .execute(&stmt::rename_database(&current, &target)?)
                .await?;
            *id = ObjectId::from_parts(&[&target])?;
            prior.name = target;
        }
        if prior.comment != desired.comment {
            self.session()
                .execute(&stmt::set_database_comment(id.segment(0), &desired.comment)?)
                .await?;
            prior.comment = desired.comment.clone();
        }
        if prior.retention_time != desired.retention_time {
            self.session()
                .execute(&stmt::set_database_retention(
                    id.segment(0),
                    desired.retention_time,
                )?)
                .await?;
            prior.retention_time = desired.retention_time;
        }
        Ok(())
    }

    /// Drop the database. Fails with NotFound if it vanished since the last
    /// read; no DROP is issued in that case.
    pub async fn delete_database(&self, id: &ObjectId) -> Result<(), ReconcileError> {
        let name = id.segment(0);
        match object_exists(self.session(), ObjectKind::Database, name, &Scope::Account).await? {
            Existence::Absent => Err(ReconcileError::NotFound {
                kind: "database",
                name: name.to_owned(),
            }),
            Existence::Unique => {
                self.session().execute(&stmt::drop_database(name)?).await?;
                Ok(())
            }
        }
    }

    /// Adopt an existing database from an externally supplied id.
    pub async fn import_database(
        &self,
        raw_id: &str,
    ) -> Result<(ObjectId, DatabaseState), ReconcileError> {
        let id = ObjectId::parse(raw_id, 1)?;
        let state = self.read_database(&id).await?;
        Ok((id, state))
    }
}
