use structmap::FromMap;
use structmap_derive::FromMap;

/// View metadata read from `information_schema.views`.
#[derive(Clone, Default, Debug, FromMap)]
pub struct ViewRow {
    pub table_catalog: String,
    pub table_schema: String,
    pub table_name: String,
    pub table_owner: String,
    /// Full definition as stored, usually prefixed with the original
    /// `create view ... as` text.
    pub view_definition: String,
    /// `YES` for secure views.
    pub is_secure: String,
    pub comment: String,
}
