//! Table reconciliation.
//!
//! Columns are force-new: changing the column list replaces the table, so
//! update only ever handles renames.

use tundra_core::schema::{AttributeKind, AttributeSpec};
use tundra_core::ReconcileError;

use crate::catalog;
use crate::exists::{object_exists, Existence, ObjectKind, Scope};
use crate::ident::{self, normalize_ident, ObjectId};
use crate::row_types::ColumnDef;
use crate::stmt;
use crate::SnowflakeProvider;

/// Declared and observed table attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableState {
    pub name: String,
    pub database: String,
    pub schema: String,
    pub columns: Vec<ColumnDef>,
}

/// The attribute surface tables expose to the host.
pub static TABLE_ATTRIBUTES: &[AttributeSpec] = &[
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
        kind: AttributeKind::Required,
        force_new: true,
        default: None,
        normalize: Some(ident::upper),
    },
    AttributeSpec {
        name: "columns",
        kind: AttributeKind::Required,
        force_new: true,
        default: None,
        normalize: Some(ident::upper),
    },
];

impl SnowflakeProvider {
    /// Create the table and return its `DB.SCHEMA.NAME` identity.
    pub async fn create_table(&self, desired: &TableState) -> Result<ObjectId, ReconcileError> {
        let statement = stmt::create_table(desired)?;
        self.session().execute(&statement).await?;
        ObjectId::from_parts(&[&desired.database, &desired.schema, &desired.name])
    }

    /// Read the live table behind `id`, columns included.
    pub async fn read_table(&self, id: &ObjectId) -> Result<TableState, ReconcileError> {
        let (database, schema, name) = (id.segment(0), id.segment(1), id.segment(2));
        let row = catalog::read_table(self.session(), database, schema, name).await?;
        let columns = catalog::describe_columns(self.session(), database, schema, name).await?;
        Ok(TableState {
            name: row.table_name,
            database: row.table_catalog,
            schema: row.table_schema,
            columns,
        })
    }

    /// Rename is the only in-place table mutation.
    pub async fn update_table(
        &self,
        id: &mut ObjectId,
        prior: &mut TableState,
        desired: &TableState,
    ) -> Result<(), ReconcileError> {
        let database = id.segment(0).to_owned();
        let schema = id.segment(1).to_owned();
        let current = id.segment(2).to_owned();
        let scope = Scope::Schema(database.clone(), schema.clone());
        match object_exists(self.session(), ObjectKind::Table, &current, &scope).await? {
            Existence::Absent => {
                return Err(ReconcileError::NotFound {
                    kind: "table",
                    name: id.to_string(),
                })
            }
            Existence::Unique => {}
        }

        let target = normalize_ident(&desired.name)?;
        if target != current {
            // Check that the rename target does not exist.
            if let Existence::Unique =
                object_exists(self.session(), ObjectKind::Table, &target, &scope).await?
            {
                return Err(ReconcileError::Conflict {
                    from: id.to_string(),
                    to: format!("{}.{}.{}", database, schema, target),
                });
            }
            self.session()
                .execute(&stmt::rename_table(&database, &schema, &current, &target)?)
                .await?;
            *id = ObjectId::from_parts(&[&database, &schema, &target])?;
            prior.name = target;
        }
        Ok(())
    }

    /// Drop the table, verifying it still exists first.
    pub async fn delete_table(&self, id: &ObjectId) -> Result<(), ReconcileError> {
        let (database, schema, name) = (id.segment(0), id.segment(1), id.segment(2));
        let scope = Scope::Schema(database.to_owned(), schema.to_owned());
        match object_exists(self.session(), ObjectKind::Table, name, &scope).await? {
            Existence::Absent => Err(ReconcileError::NotFound {
                kind: "table",
                name: id.to_string(),
            }),
            Existence::Unique => {
                self.session()
                    .execute(&stmt::drop_table(database, schema, name)?)
                    .await?;
                Ok(())
            }
        }
    }

    /// Adopt an existing table from an externally supplied id.
    pub async fn import_table(
        &self,
        raw_id: &str,
    ) -> Result<(ObjectId, TableState), ReconcileError> {
        let id = ObjectId::parse(raw_id, 3)?;
        let state = self.read_table(&id).await?;
        Ok((id, state))
    }
}
