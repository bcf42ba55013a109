//! Per-object-kind reconcilers.
//!
//! Each submodule owns one object kind: its typed desired-state record, its
//! declared attribute surface, and the create / read / update / delete /
//! import operations on [`crate::SnowflakeProvider`]. Updates run one ALTER
//! per changed attribute, rename first so every later statement addresses
//! the object by its new identity, and each applied attribute is
//! checkpointed into the caller-held prior state before the next one is
//! attempted. A mid-sequence failure therefore leaves earlier changes both
//! applied and recorded; nothing is rolled back.

mod database;
mod grant;
mod pipe;
mod role;
mod schema;
mod stage;
mod table;
mod user;
mod view;

pub use database::{DatabaseState, DATABASE_ATTRIBUTES};
pub use grant::{GrantState, Grantee, GRANT_ATTRIBUTES};
pub use pipe::{PipeState, PIPE_ATTRIBUTES};
pub use role::{RoleState, ROLE_ATTRIBUTES};
pub use schema::{SchemaState, SCHEMA_ATTRIBUTES};
pub use stage::{StageState, STAGE_ATTRIBUTES};
pub use table::{TableState, TABLE_ATTRIBUTES};
pub use user::{key_fingerprint, UserState, USER_ATTRIBUTES};
pub use view::{ViewState, VIEW_ATTRIBUTES};

use tundra_core::ReconcileError;

/// Parse a count column ("5", "") that the catalog reports as text.
pub(crate) fn parse_count(raw: &str, what: &str) -> Result<i64, ReconcileError> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<i64>().map_err(|e| {
        ReconcileError::Driver(anyhow::anyhow!(
            "couldn't parse {} \"{}\": {}",
            what,
            raw,
            e
        ))
    })
}
