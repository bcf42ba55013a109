use structmap::FromMap;
use structmap_derive::FromMap;

/// One row of `SHOW ROLES` output.
#[derive(Clone, Default, Debug, FromMap)]
pub struct RoleRow {
    pub created_on: String,
    /// The role name in Snowflake.
    pub name: String,
    pub is_default: String,
    pub is_current: String,
    pub is_inherited: String,
    pub assigned_to_users: String,
    pub granted_to_roles: String,
    pub granted_roles: String,
    pub owner: String,
    pub comment: String,
}
