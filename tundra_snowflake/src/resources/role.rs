//! Role reconciliation.

use tundra_core::schema::{AttributeKind, AttributeSpec};
use tundra_core::ReconcileError;

use crate::catalog;
use crate::exists::{object_exists, Existence, ObjectKind, Scope};
use crate::ident::{self, normalize_ident, ObjectId};
use crate::stmt;
use crate::SnowflakeProvider;

/// Declared and observed role attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleState {
    pub name: String,
    pub comment: String,
}

/// The attribute surface roles expose to the host.
pub static ROLE_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec {
        name: "name",
        kind: AttributeKind::Required,
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
];

impl SnowflakeProvider {
    /// Create the role and return its identity.
    pub async fn create_role(&self, desired: &RoleState) -> Result<ObjectId, ReconcileError> {
        let statement = stmt::create_role(desired)?;
        self.session().execute(&statement).await?;
        ObjectId::from_parts(&[&desired.name])
    }

    /// Read the live role behind `id` back into state shape.
    pub async fn read_role(&self, id: &ObjectId) -> Result<RoleState, ReconcileError> {
        let row = catalog::show_role(self.session(), id.segment(0)).await?;
        Ok(RoleState {
            name: row.name,
            comment: row.comment,
        })
    }

    /// Apply the changed attributes, rename first. Clearing the comment
    /// unsets it instead of writing an empty literal.
    pub async fn update_role(
        &self,
        id: &mut ObjectId,
        prior: &mut RoleState,
        desired: &RoleState,
    ) -> Result<(), ReconcileError> {
        let current = id.segment(0).to_owned();
        match object_exists(self.session(), ObjectKind::Role, &current, &Scope::Account).await? {
            Existence::Absent => {
                return Err(ReconcileError::NotFound {
                    kind: "role",
                    name: current,
                })
            }
            Existence::Unique => {}
        }

        let target = normalize_ident(&desired.name)?;
        if target != current {
            // Check that the rename target does not exist.
            if let Existence::Unique =
                object_exists(self.session(), ObjectKind::Role, &target, &Scope::Account).await?
            {
                return Err(ReconcileError::Conflict {
                    from: current,
                    to: target,
                });
            }
            self.session()
                .execute(&stmt::rename_role(&current, &target)?)
                .await?;
            *id = ObjectId::from_parts(&[&target])?;
            prior.name = target;
        }
        if prior.comment != desired.comment {
            self.session()
                .execute(&stmt::set_role_comment(id.segment(0), &desired.comment)?)
                .await?;
            prior.comment = desired.comment.clone();
        }
        Ok(())
    }

    /// Drop the role, verifying it still exists first.
    pub async fn delete_role(&self, id: &ObjectId) -> Result<(), ReconcileError> {
        let name = id.segment(0);
        match object_exists(self.session(), ObjectKind::Role, name, &Scope::Account).await? {
            Existence::Absent => Err(ReconcileError::NotFound {
                kind: "role",
                name: name.to_owned(),
            }),
            Existence::Unique => {
                self.session().execute(&stmt::drop_role(name)?).await?;
                Ok(())
            }
        }
    }

    /// Adopt an existing role from an externally supplied id.
    pub async fn import_role(
        &self,
        raw_id: &str,
    ) -> Result<(ObjectId, RoleState), ReconcileError> {
        let id = ObjectId::parse(raw_id, 1)?;
        let state = self.read_role(&id).await?;
        Ok((id, state))
    }
}
