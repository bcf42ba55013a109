use structmap::FromMap;
use structmap_derive::FromMap;

/// Table metadata read from `information_schema.tables`.
#[derive(Clone, Default, Debug, FromMap)]
pub struct TableRow {
    pub table_catalog: String,
    pub table_schema: String,
    pub table_name: String,
    pub table_owner: String,
    pub table_type: String,
    pub is_transient: String,
    pub retention_time: String,
    pub comment: String,
}

/// One column of a table, both as declared and as described by the catalog.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}
