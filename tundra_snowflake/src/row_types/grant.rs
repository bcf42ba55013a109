use structmap::FromMap;
use structmap_derive::FromMap;

/// The object kinds a privilege can be granted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecurableKind {
    Table,
    View,
}

impl SecurableKind {
    /// The keyword used in GRANT/REVOKE and SHOW GRANTS statements.
    pub fn keyword(&self) -> &'static str {
        match self {
            SecurableKind::Table => "TABLE",
            SecurableKind::View => "VIEW",
        }
    }

    /// The plural used by the `ON ALL ... IN` form.
    pub fn plural(&self) -> &'static str {
        match self {
            SecurableKind::Table => "TABLES",
            SecurableKind::View => "VIEWS",
        }
    }
}

/// One row of `SHOW GRANTS ON <object>` output.
#[derive(Clone, Default, Debug, FromMap)]
pub struct GrantRow {
    pub created_on: String,
    pub privilege: String,
    /// Object kind the privilege is granted on (`TABLE`, `VIEW`).
    pub granted_on: String,
    /// Fully-qualified name of the securable object.
    pub name: String,
    /// Grantee class: `ROLE` or `SHARE`.
    pub granted_to: String,
    pub grantee_name: String,
    pub grant_option: String,
    pub granted_by: String,
}
