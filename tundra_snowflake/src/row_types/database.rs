use structmap::FromMap;
use structmap_derive::FromMap;

/// One row of `SHOW DATABASES` output.
#[derive(Clone, Default, Debug, FromMap)]
pub struct DatabaseRow {
    pub created_on: String,
    /// The database name in Snowflake.
    pub name: String,
    pub is_default: String,
    pub is_current: String,
    pub origin: String,
    pub owner: String,
    pub comment: String,
    /// `TRANSIENT` for transient databases, empty otherwise.
    pub options: String,
    pub retention_time: String,
}
