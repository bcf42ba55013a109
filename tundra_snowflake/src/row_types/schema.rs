use structmap::FromMap;
use structmap_derive::FromMap;

/// One row of `SHOW SCHEMAS` output.
#[derive(Clone, Default, Debug, FromMap)]
pub struct SchemaRow {
    pub created_on: String,
    /// The schema name in Snowflake.
    pub name: String,
    pub is_default: String,
    pub is_current: String,
    pub database_name: String,
    pub owner: String,
    pub comment: String,
    pub options: String,
    pub retention_time: String,
}
