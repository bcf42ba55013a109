//! Catalog readers: one function per object kind, returning a typed
//! snapshot of the live object.
//!
//! Every reader runs the existence check first, so an absent object surfaces
//! as [`ReconcileError::NotFound`] (the host prunes it from state) and a
//! multi-match stops the operation before anything is read from the wrong
//! object.

use tundra_core::ReconcileError;

use crate::exists::{object_exists, Existence, ObjectKind, Scope};
use crate::from_rows;
use crate::ident::escape_literal;
use crate::row_types::{
    ColumnDef, DatabaseRow, GrantRow, PipeRow, RoleRow, SchemaRow, SecurableKind, StageProperties,
    TableRow, UserProperties, ViewRow,
};
use crate::session::{QueryData, Session};

fn not_found(kind: ObjectKind, name: impl Into<String>) -> ReconcileError {
    ReconcileError::NotFound {
        kind: kind.singular(),
        name: name.into(),
    }
}

/// Require a unique match for `name` in `scope` before reading it.
async fn require_unique(
    session: &dyn Session,
    kind: ObjectKind,
    name: &str,
    scope: &Scope,
    display_name: &str,
) -> Result<(), ReconcileError> {
    match object_exists(session, kind, name, scope).await? {
        Existence::Absent => Err(not_found(kind, display_name)),
        Existence::Unique => Ok(()),
    }
}

pub(crate) async fn show_database(
    session: &dyn Session,
    name: &str,
) -> Result<DatabaseRow, ReconcileError> {
    require_unique(session, ObjectKind::Database, name, &Scope::Account, name).await?;
    let data = session
        .query(&format!(
            "SHOW DATABASES LIKE '{}'",
            escape_literal(name)
        ))
        .await?;
    from_rows::<DatabaseRow>(&data)
        .into_iter()
        .next()
        .ok_or_else(|| not_found(ObjectKind::Database, name))
}

pub(crate) async fn show_schema(
    session: &dyn Session,
    database: &str,
    name: &str,
) -> Result<SchemaRow, ReconcileError> {
    let display = format!("{}.{}", database, name);
    let scope = Scope::Database(database.to_owned());
    require_unique(session, ObjectKind::Schema, name, &scope, &display).await?;
    let data = session
        .query(&format!(
            "SHOW SCHEMAS LIKE '{}' IN {}",
            escape_literal(name),
            database
        ))
        .await?;
    from_rows::<SchemaRow>(&data)
        .into_iter()
        .next()
        .ok_or_else(|| not_found(ObjectKind::Schema, display))
}

pub(crate) async fn read_table(
    session: &dyn Session,
    database: &str,
    schema: &str,
    name: &str,
) -> Result<TableRow, ReconcileError> {
    let display = format!("{}.{}.{}", database, schema, name);
    let scope = Scope::Schema(database.to_owned(), schema.to_owned());
    require_unique(session, ObjectKind::Table, name, &scope, &display).await?;
    let data = session
        .query(&format!(
            "SELECT table_catalog, table_schema, table_name, table_owner, table_type, \
             is_transient, retention_time, comment \
             FROM {}.information_schema.tables \
             WHERE table_name = '{}' AND table_schema = '{}'",
            database,
            escape_literal(name),
            escape_literal(schema)
        ))
        .await?;
    from_rows::<TableRow>(&data)
        .into_iter()
        .next()
        .ok_or_else(|| not_found(ObjectKind::Table, display))
}

/// Describe a table's columns, in server order.
pub(crate) async fn describe_columns(
    session: &dyn Session,
    database: &str,
    schema: &str,
    name: &str,
) -> Result<Vec<ColumnDef>, ReconcileError> {
    let display = format!("{}.{}.{}", database, schema, name);
    let scope = Scope::Schema(database.to_owned(), schema.to_owned());
    require_unique(session, ObjectKind::Table, name, &scope, &display).await?;
    let data = session
        .query(&format!("DESC TABLE {}", display))
        .await?;
    let name_idx = field_index(&data, "name")?;
    let type_idx = field_index(&data, "type")?;
    Ok(data
        .rows
        .iter()
        .map(|row| ColumnDef::new(cell(row, name_idx), cell(row, type_idx)))
        .collect())
}

pub(crate) async fn read_view(
    session: &dyn Session,
    database: &str,
    schema: &str,
    name: &str,
) -> Result<ViewRow, ReconcileError> {
    let display = format!("{}.{}.{}", database, schema, name);
    let scope = Scope::Schema(database.to_owned(), schema.to_owned());
    require_unique(session, ObjectKind::View, name, &scope, &display).await?;
    let data = session
        .query(&format!(
            "SELECT table_catalog, table_schema, table_name, table_owner, view_definition, \
             is_secure, comment \
             FROM {}.information_schema.views \
             WHERE table_name = '{}' AND table_schema = '{}'",
            database,
            escape_literal(name),
            escape_literal(schema)
        ))
        .await?;
    from_rows::<ViewRow>(&data)
        .into_iter()
        .next()
        .ok_or_else(|| not_found(ObjectKind::View, display))
}

pub(crate) async fn show_pipe(
    session: &dyn Session,
    database: &str,
    schema: &str,
    name: &str,
) -> Result<PipeRow, ReconcileError> {
    let display = format!("{}.{}.{}", database, schema, name);
    let scope = Scope::Schema(database.to_owned(), schema.to_owned());
    require_unique(session, ObjectKind::Pipe, name, &scope, &display).await?;
    let data = session
        .query(&format!(
            "SHOW PIPES LIKE '{}' IN {}.{}",
            escape_literal(name),
            database,
            schema
        ))
        .await?;
    from_rows::<PipeRow>(&data)
        .into_iter()
        .next()
        .ok_or_else(|| not_found(ObjectKind::Pipe, display))
}

pub(crate) async fn describe_stage(
    session: &dyn Session,
    database: &str,
    schema: &str,
    name: &str,
) -> Result<StageProperties, ReconcileError> {
    let display = format!("{}.{}.{}", database, schema, name);
    let scope = Scope::Schema(database.to_owned(), schema.to_owned());
    require_unique(session, ObjectKind::Stage, name, &scope, &display).await?;
    let data = session
        .query(&format!("DESC STAGE {}", display))
        .await?;
    let prop_idx = field_index(&data, "property")?;
    let value_idx = field_index(&data, "property_value")?;
    let mut props = StageProperties::default();
    for row in &data.rows {
        props.apply(&cell(row, prop_idx), &cell(row, value_idx));
    }
    Ok(props)
}

pub(crate) async fn describe_user(
    session: &dyn Session,
    name: &str,
) -> Result<UserProperties, ReconcileError> {
    require_unique(session, ObjectKind::User, name, &Scope::Account, name).await?;
    let data = session.query(&format!("DESC USER {}", name)).await?;
    let prop_idx = field_index(&data, "property")?;
    let value_idx = field_index(&data, "value")?;
    let mut props = UserProperties::default();
    for row in &data.rows {
        props.apply(&cell(row, prop_idx), &cell(row, value_idx));
    }
    Ok(props)
}

pub(crate) async fn show_role(
    session: &dyn Session,
    name: &str,
) -> Result<RoleRow, ReconcileError> {
    require_unique(session, ObjectKind::Role, name, &Scope::Account, name).await?;
    let data = session
        .query(&format!("SHOW ROLES LIKE '{}'", escape_literal(name)))
        .await?;
    from_rows::<RoleRow>(&data)
        .into_iter()
        .next()
        .ok_or_else(|| not_found(ObjectKind::Role, name))
}

/// List the grants held on one securable object.
pub(crate) async fn show_grants_on(
    session: &dyn Session,
    kind: SecurableKind,
    database: &str,
    schema: &str,
    object: &str,
) -> Result<Vec<GrantRow>, ReconcileError> {
    let data = session
        .query(&format!(
            "SHOW GRANTS ON {} {}.{}.{}",
            kind.keyword(),
            database,
            schema,
            object
        ))
        .await?;
    Ok(from_rows::<GrantRow>(&data))
}

fn cell(row: &[String], index: usize) -> String {
    row.get(index).cloned().unwrap_or_default()
}

fn field_index(data: &QueryData, name: &str) -> Result<usize, ReconcileError> {
    data.fields
        .iter()
        .position(|f| f.eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            ReconcileError::Driver(anyhow::anyhow!(
                "result set is missing the \"{}\" column",
                name
            ))
        })
}
