use structmap::FromMap;
use structmap_derive::FromMap;

/// One row of `SHOW PIPES` output.
#[derive(Clone, Default, Debug, FromMap)]
pub struct PipeRow {
    pub created_on: String,
    /// The pipe name in Snowflake.
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    /// The COPY statement the pipe runs.
    pub definition: String,
    pub owner: String,
    /// Set when the pipe ingests from a notification channel; empty
    /// otherwise. The auto-ingest flag is derived from this.
    pub notification_channel: String,
    pub comment: String,
}
