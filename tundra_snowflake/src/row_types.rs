//! Typed snapshots of catalog listing and description output.
//!
//! One row type per listing command. SHOW and information-schema output is
//! marshaled into these by column name; DESC-style property listings go
//! through explicit property-to-setter tables. Each snapshot lives for one
//! read call; the remote catalog stays authoritative.

mod database;
mod grant;
mod pipe;
mod role;
mod schema;
mod stage;
mod table;
mod view;
mod user;

pub use database::DatabaseRow;
pub use grant::{GrantRow, SecurableKind};
pub use pipe::PipeRow;
pub use role::RoleRow;
pub use schema::SchemaRow;
pub use stage::StageProperties;
pub use table::{ColumnDef, TableRow};
pub use view::ViewRow;
pub use user::UserProperties;
