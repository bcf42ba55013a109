//! Statement builders: desired-state records rendered to SQL text.
//!
//! These are pure functions over the declared attributes. They never look at
//! remote state; uniqueness and presence checks belong to the reconcilers.
//! Optional clauses are appended only when the attribute is non-empty,
//! multi-valued attributes are comma-joined, and every identifier or literal
//! position goes through the normalizers in [`crate::ident`], so a
//! validation failure here stops the operation before any statement text is
//! sent anywhere.

use lazy_static::lazy_static;
use regex::Regex;

use tundra_core::ReconcileError;

use crate::ident::{
    escape_literal, normalize_column_type, normalize_ident, normalize_privilege,
};
use crate::resources::{
    DatabaseState, GrantState, PipeState, RoleState, SchemaState, StageState, TableState,
    UserState, ViewState,
};
use crate::row_types::SecurableKind;

lazy_static! {
    /// Matches a `create view <name> as` prefix embedded in a declared view
    /// definition, capturing the qualified name.
    static ref RE_VIEW_PREFIX: Regex =
        Regex::new(r"(?i)^create (?:or replace )?(?:secure )?view\s+(\S+)\s+as\n").unwrap();
}

// --- databases ---

pub(crate) fn create_database(desired: &DatabaseState) -> Result<String, ReconcileError> {
    let name = normalize_ident(&desired.name)?;
    let keyword = if desired.transient {
        "CREATE TRANSIENT DATABASE"
    } else {
        "CREATE DATABASE"
    };
    let mut statement = format!(
        "{} {} DATA_RETENTION_TIME_IN_DAYS = {}",
        keyword, name, desired.retention_time
    );
    if !desired.comment.is_empty() {
        statement += &format!(" COMMENT = '{}'", escape_literal(&desired.comment));
    }
    Ok(statement)
}

pub(crate) fn rename_database(current: &str, target: &str) -> Result<String, ReconcileError> {
    Ok(format!(
        "ALTER DATABASE {} RENAME TO {}",
        normalize_ident(current)?,
        normalize_ident(target)?
    ))
}

pub(crate) fn set_database_comment(name: &str, comment: &str) -> Result<String, ReconcileError> {
    Ok(format!(
        "ALTER DATABASE {} SET COMMENT = '{}'",
        normalize_ident(name)?,
        escape_literal(comment)
    ))
}

pub(crate) fn set_database_retention(name: &str, days: i64) -> Result<String, ReconcileError> {
    Ok(format!(
        "ALTER DATABASE {} SET DATA_RETENTION_TIME_IN_DAYS = {}",
        normalize_ident(name)?,
        days
    ))
}

pub(crate) fn drop_database(name: &str) -> Result<String, ReconcileError> {
    Ok(format!("DROP DATABASE {}", normalize_ident(name)?))
}

// --- schemas ---

pub(crate) fn create_schema(desired: &SchemaState) -> Result<String, ReconcileError> {
    let id = format!(
        "{}.{}",
        normalize_ident(&desired.database)?,
        normalize_ident(&desired.name)?
    );
    let keyword = if desired.transient {
        "CREATE TRANSIENT SCHEMA"
    } else {
        "CREATE SCHEMA"
    };
    let mut statement = format!(
        "{} {} DATA_RETENTION_TIME_IN_DAYS = {}",
        keyword, id, desired.retention_time
    );
    if !desired.comment.is_empty() {
        statement += &format!(" COMMENT = '{}'", escape_literal(&desired.comment));
    }
    Ok(statement)
}

pub(crate) fn rename_schema(
    database: &str,
    current: &str,
    target: &str,
) -> Result<String, ReconcileError> {
    let database = normalize_ident(database)?;
    Ok(format!(
        "ALTER SCHEMA {}.{} RENAME TO {}.{}",
        database,
        normalize_ident(current)?,
        database,
        normalize_ident(target)?
    ))
}

pub(crate) fn set_schema_comment(
    database: &str,
    name: &str,
    comment: &str,
) -> Result<String, ReconcileError> {
    Ok(format!(
        "ALTER SCHEMA {}.{} SET COMMENT = '{}'",
        normalize_ident(database)?,
        normalize_ident(name)?,
        escape_literal(comment)
    ))
}

pub(crate) fn set_schema_retention(
    database: &str,
    name: &str,
    days: i64,
) -> Result<String, ReconcileError> {
    Ok(format!(
        "ALTER SCHEMA {}.{} SET DATA_RETENTION_TIME_IN_DAYS = {}",
        normalize_ident(database)?,
        normalize_ident(name)?,
        days
    ))
}

pub(crate) fn drop_schema(database: &str, name: &str) -> Result<String, ReconcileError> {
    Ok(format!(
        "DROP SCHEMA {}.{}",
        normalize_ident(database)?,
        normalize_ident(name)?
    ))
}

// --- tables ---

pub(crate) fn create_table(desired: &TableState) -> Result<String, ReconcileError> {
    if desired.columns.is_empty() {
        return Err(ReconcileError::Validation(
            "a table needs at least one column".to_owned(),
        ));
    }
    let id = format!(
        "{}.{}.{}",
        normalize_ident(&desired.database)?,
        normalize_ident(&desired.schema)?,
        normalize_ident(&desired.name)?
    );
    let column_defs = desired
        .columns
        .iter()
        .map(|c| {
            Ok(format!(
                "{} {}",
                normalize_ident(&c.name)?,
                normalize_column_type(&c.data_type)?
            ))
        })
        .collect::<Result<Vec<_>, ReconcileError>>()?
        .join(", ");
    Ok(format!("CREATE TABLE {} ( {} )", id, column_defs))
}

pub(crate) fn rename_table(
    database: &str,
    schema: &str,
    current: &str,
    target: &str,
) -> Result<String, ReconcileError> {
    let database = normalize_ident(database)?;
    let schema = normalize_ident(schema)?;
    Ok(format!(
        "ALTER TABLE {}.{}.{} RENAME TO {}.{}.{}",
        database,
        schema,
        normalize_ident(current)?,
        database,
        schema,
        normalize_ident(target)?
    ))
}

pub(crate) fn drop_table(
    database: &str,
    schema: &str,
    name: &str,
) -> Result<String, ReconcileError> {
    Ok(format!(
        "DROP TABLE {}.{}.{}",
        normalize_ident(database)?,
        normalize_ident(schema)?,
        normalize_ident(name)?
    ))
}

// --- views ---

/// Strip an embedded `create view ... as` prefix off a declared definition,
/// leaving the bare SELECT. Definitions without the prefix pass through.
pub fn strip_view_prefix(definition: &str) -> &str {
    match RE_VIEW_PREFIX.find(definition) {
        Some(m) => &definition[m.end()..],
        None => definition,
    }
}

pub(crate) fn create_view(desired: &ViewState) -> Result<String, ReconcileError> {
    let id = format!(
        "{}.{}.{}",
        normalize_ident(&desired.database)?,
        normalize_ident(&desired.schema)?,
        normalize_ident(&desired.name)?
    );
    // A definition pasted from SHOW output carries its own create prefix.
    // If it names somewhere other than the declared location, refuse to run
    // it rather than create an object in the wrong place.
    if let Some(captures) = RE_VIEW_PREFIX.captures(&desired.view_definition) {
        let embedded = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        let embedded_id = crate::ident::ObjectId::parse(embedded, 3).map_err(|_| {
            ReconcileError::Validation(format!(
                "view definition names \"{}\", which is not a fully-qualified view name",
                embedded
            ))
        })?;
        if embedded_id.to_string() != id {
            return Err(ReconcileError::Validation(format!(
                "view definition names {}, but the view is declared at {}",
                embedded_id, id
            )));
        }
    }
    let keyword = if desired.secure {
        "CREATE SECURE VIEW"
    } else {
        "CREATE VIEW"
    };
    let mut statement = format!("{} {}", keyword, id);
    if !desired.comment.is_empty() {
        statement += &format!(" COMMENT = '{}'", escape_literal(&desired.comment));
    }
    statement += &format!(" AS\n{}", strip_view_prefix(&desired.view_definition));
    Ok(statement)
}

pub(crate) fn drop_view(
    database: &str,
    schema: &str,
    name: &str,
) -> Result<String, ReconcileError> {
    Ok(format!(
        "DROP VIEW {}.{}.{}",
        normalize_ident(database)?,
        normalize_ident(schema)?,
        normalize_ident(name)?
    ))
}

// --- pipes ---

pub(crate) fn create_pipe(desired: &PipeState) -> Result<String, ReconcileError> {
    let copy_statement = desired.copy_statement.trim();
    if copy_statement.is_empty() {
        return Err(ReconcileError::Validation(
            "a pipe needs a copy statement".to_owned(),
        ));
    }
    let id = format!(
        "{}.{}.{}",
        normalize_ident(&desired.database)?,
        normalize_ident(&desired.schema)?,
        normalize_ident(&desired.name)?
    );
    let mut statement = format!(
        "CREATE PIPE {} AUTO_INGEST = {}",
        id,
        if desired.auto_ingest { "TRUE" } else { "FALSE" }
    );
    if !desired.comment.is_empty() {
        statement += &format!(" COMMENT = '{}'", escape_literal(&desired.comment));
    }
    statement += &format!(" AS {}", copy_statement);
    Ok(statement)
}

pub(crate) fn set_pipe_comment(
    database: &str,
    schema: &str,
    name: &str,
    comment: &str,
) -> Result<String, ReconcileError> {
    Ok(format!(
        "ALTER PIPE {}.{}.{} SET COMMENT = '{}'",
        normalize_ident(database)?,
        normalize_ident(schema)?,
        normalize_ident(name)?,
        escape_literal(comment)
    ))
}

pub(crate) fn drop_pipe(
    database: &str,
    schema: &str,
    name: &str,
) -> Result<String, ReconcileError> {
    Ok(format!(
        "DROP PIPE {}.{}.{}",
        normalize_ident(database)?,
        normalize_ident(schema)?,
        normalize_ident(name)?
    ))
}

// --- stages ---

pub(crate) fn create_stage(desired: &StageState) -> Result<String, ReconcileError> {
    if !desired.credentials.is_empty() && !desired.aws_role.is_empty() {
        return Err(ReconcileError::Validation(
            "credentials and aws_role are mutually exclusive".to_owned(),
        ));
    }
    let mut statement = format!(
        "CREATE STAGE {}.{}.{}",
        normalize_ident(&desired.database)?,
        normalize_ident(&desired.schema)?,
        normalize_ident(&desired.name)?
    );
    if !desired.url.is_empty() {
        statement += &format!(" URL = '{}'", escape_literal(&desired.url.to_lowercase()));
    }
    if !desired.credentials.is_empty() {
        // The credentials value is a key/value clause body. It cannot be
        // quoted wholesale, so it is fenced instead.
        if desired.credentials.contains(')') || desired.credentials.contains(';') {
            return Err(ReconcileError::Validation(
                "stage credentials must not contain ')' or ';'".to_owned(),
            ));
        }
        statement += &format!(" CREDENTIALS = ({})", desired.credentials);
    }
    if !desired.aws_role.is_empty() {
        statement += &format!(
            " CREDENTIALS = (AWS_ROLE = '{}')",
            escape_literal(&desired.aws_role)
        );
    }
    Ok(statement)
}

pub(crate) fn drop_stage(
    database: &str,
    schema: &str,
    name: &str,
) -> Result<String, ReconcileError> {
    Ok(format!(
        "DROP STAGE {}.{}.{}",
        normalize_ident(database)?,
        normalize_ident(schema)?,
        normalize_ident(name)?
    ))
}

// --- users ---

pub(crate) fn create_user(desired: &UserState) -> Result<String, ReconcileError> {
    let mut statement = format!("CREATE USER {}", normalize_ident(&desired.name)?);
    if desired.must_change_password {
        statement += " MUST_CHANGE_PASSWORD = TRUE";
    }
    if !desired.login_name.is_empty() {
        statement += &format!(
            " LOGIN_NAME = '{}'",
            escape_literal(&desired.login_name.to_uppercase())
        );
    }
    if !desired.email.is_empty() {
        statement += &format!(
            " EMAIL = '{}'",
            escape_literal(&desired.email.to_uppercase())
        );
    }
    if !desired.default_role.is_empty() {
        statement += &format!(
            " DEFAULT_ROLE = '{}'",
            escape_literal(&desired.default_role.to_uppercase())
        );
    }
    if !desired.default_warehouse.is_empty() {
        statement += &format!(
            " DEFAULT_WAREHOUSE = '{}'",
            escape_literal(&desired.default_warehouse.to_uppercase())
        );
    }
    if !desired.rsa_public_key.is_empty() {
        statement += &format!(
            " RSA_PUBLIC_KEY = '{}'",
            escape_literal(&desired.rsa_public_key)
        );
    }
    Ok(statement)
}

pub(crate) fn rename_user(current: &str, target: &str) -> Result<String, ReconcileError> {
    Ok(format!(
        "ALTER USER {} RENAME TO {}",
        normalize_ident(current)?,
        normalize_ident(target)?
    ))
}

pub(crate) fn set_user_property(
    name: &str,
    property: &str,
    value: &str,
) -> Result<String, ReconcileError> {
    Ok(format!(
        "ALTER USER {} SET {} = '{}'",
        normalize_ident(name)?,
        property,
        escape_literal(value)
    ))
}

pub(crate) fn set_user_must_change_password(
    name: &str,
    value: bool,
) -> Result<String, ReconcileError> {
    Ok(format!(
        "ALTER USER {} SET MUST_CHANGE_PASSWORD = {}",
        normalize_ident(name)?,
        if value { "TRUE" } else { "FALSE" }
    ))
}

pub(crate) fn drop_user(name: &str) -> Result<String, ReconcileError> {
    Ok(format!("DROP USER {}", normalize_ident(name)?))
}

// --- roles ---

pub(crate) fn create_role(desired: &RoleState) -> Result<String, ReconcileError> {
    let mut statement = format!("CREATE ROLE {}", normalize_ident(&desired.name)?);
    if !desired.comment.is_empty() {
        statement += &format!(" COMMENT = '{}'", escape_literal(&desired.comment));
    }
    Ok(statement)
}

pub(crate) fn rename_role(current: &str, target: &str) -> Result<String, ReconcileError> {
    Ok(format!(
        "ALTER ROLE {} RENAME TO {}",
        normalize_ident(current)?,
        normalize_ident(target)?
    ))
}

pub(crate) fn set_role_comment(name: &str, comment: &str) -> Result<String, ReconcileError> {
    let name = normalize_ident(name)?;
    if comment.is_empty() {
        Ok(format!("ALTER ROLE {} UNSET COMMENT", name))
    } else {
        Ok(format!(
            "ALTER ROLE {} SET COMMENT = '{}'",
            name,
            escape_literal(comment)
        ))
    }
}

pub(crate) fn drop_role(name: &str) -> Result<String, ReconcileError> {
    Ok(format!("DROP ROLE {}", normalize_ident(name)?))
}

// --- grants ---

fn privilege_list(privileges: &[String]) -> Result<String, ReconcileError> {
    if privileges.is_empty() {
        return Err(ReconcileError::Validation(
            "a grant needs at least one privilege".to_owned(),
        ));
    }
    Ok(privileges
        .iter()
        .map(|p| normalize_privilege(p))
        .collect::<Result<Vec<_>, _>>()?
        .join(", "))
}

/// Render a GRANT statement. A literal object name of `ALL` grants on every
/// object of the kind in the schema (`ON ALL TABLES IN db.schema`), never on
/// a single object called ALL.
pub(crate) fn grant(kind: SecurableKind, desired: &GrantState) -> Result<String, ReconcileError> {
    let privileges = privilege_list(&desired.privileges)?;
    let database = normalize_ident(&desired.database)?;
    let schema = normalize_ident(&desired.schema)?;
    let object = normalize_ident(&desired.object)?;
    let target = if object == "ALL" {
        format!("ALL {} IN {}.{}", kind.plural(), database, schema)
    } else {
        format!("{}.{}.{}", database, schema, object)
    };
    Ok(format!(
        "GRANT {} ON {} TO {} {}",
        privileges,
        target,
        desired.grantee.keyword(),
        normalize_ident(desired.grantee.name())?
    ))
}

/// Render the matching REVOKE statement.
pub(crate) fn revoke(kind: SecurableKind, desired: &GrantState) -> Result<String, ReconcileError> {
    let privileges = privilege_list(&desired.privileges)?;
    let database = normalize_ident(&desired.database)?;
    let schema = normalize_ident(&desired.schema)?;
    let object = normalize_ident(&desired.object)?;
    let target = if object == "ALL" {
        format!("ALL {} IN {}.{}", kind.plural(), database, schema)
    } else {
        format!("{}.{}.{}", database, schema, object)
    };
    Ok(format!(
        "REVOKE {} ON {} FROM {} {}",
        privileges,
        target,
        desired.grantee.keyword(),
        normalize_ident(desired.grantee.name())?
    ))
}
