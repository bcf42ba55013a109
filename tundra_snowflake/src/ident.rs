//! Identifier normalization and SQL text safety.
//!
//! Unquoted Snowflake identifiers are case-insensitive, so every name is
//! upper-cased by convention before it is used in a lookup or stored as a
//! durable handle. That keeps the declared representation and the remote
//! representation comparable. The catalog also allows quoted, case-sensitive
//! identifiers, which means `"foo"` and `"FOO"` can both exist and collide
//! under this normalization; the existence check is the safety net that
//! turns that collision into a hard error instead of a silent mutation of
//! the wrong object.
//!
//! Nothing user-supplied reaches statement text unchecked: identifier
//! segments are validated against the unquoted-identifier charset and
//! string values go through [`escape_literal`].

use std::fmt;

use tundra_core::ReconcileError;

/// Upper-case and validate one identifier segment.
///
/// Only the unquoted-identifier charset is accepted; anything else would
/// need quoting to round-trip and is rejected as invalid desired state.
pub fn normalize_ident(raw: &str) -> Result<String, ReconcileError> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        None => false,
    };
    if !valid {
        return Err(ReconcileError::Validation(format!(
            "\"{}\" is not a valid unquoted identifier",
            raw
        )));
    }
    Ok(trimmed.to_uppercase())
}

/// Upper-case and validate a privilege keyword (`SELECT`, `CREATE TABLE`).
pub fn normalize_privilege(raw: &str) -> Result<String, ReconcileError> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == ' ' || c == '_')
    {
        return Err(ReconcileError::Validation(format!(
            "\"{}\" is not a valid privilege",
            raw
        )));
    }
    Ok(trimmed.to_uppercase())
}

/// Validate a column type (`VARCHAR`, `NUMBER(38,0)`).
pub fn normalize_column_type(raw: &str) -> Result<String, ReconcileError> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '(' | ')' | ',' | ' ' | '_'))
    {
        return Err(ReconcileError::Validation(format!(
            "\"{}\" is not a valid column type",
            raw
        )));
    }
    Ok(trimmed.to_uppercase())
}

/// Escape a value for single-quoted string-literal position.
pub fn escape_literal(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "''")
}

/// Upper-case normalizer for declared attribute surfaces.
pub fn upper(raw: &str) -> String {
    raw.to_uppercase()
}

/// Lower-case normalizer for declared attribute surfaces.
pub fn lower(raw: &str) -> String {
    raw.to_lowercase()
}

/// Whitespace-trimming normalizer for declared attribute surfaces.
pub fn trim(raw: &str) -> String {
    raw.trim().to_owned()
}

/// A dot-delimited composite identity, the durable handle for a remote
/// object. Segment count and meaning depend on the object kind: `NAME`,
/// `DB.NAME`, `DB.SCHEMA.NAME`, or `GRANTEE.DB.SCHEMA.OBJECT.PRIV...`.
/// Segments are always stored normalized; an identity holding stale or
/// differently-cased segments silently matches zero rows on lookup, which is
/// exactly the drift hazard normalization exists to prevent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(Vec<String>);

impl ObjectId {
    /// Build an identity from raw segments, normalizing each.
    pub fn from_parts<S: AsRef<str>>(parts: &[S]) -> Result<Self, ReconcileError> {
        let segments = parts
            .iter()
            .map(|p| normalize_ident(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(segments))
    }

    /// Build an identity from segments that are already normalized (grant
    /// identities carry privilege segments that are not plain identifiers).
    pub(crate) fn from_normalized(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Parse an externally supplied dotted id, normalizing each segment and
    /// checking the segment count expected for the object kind.
    pub fn parse(raw: &str, expected_segments: usize) -> Result<Self, ReconcileError> {
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() != expected_segments {
            return Err(ReconcileError::Validation(format!(
                "id \"{}\" has {} segments, expected {}",
                raw,
                parts.len(),
                expected_segments
            )));
        }
        Self::from_parts(&parts)
    }

    /// The normalized segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// One segment by position.
    pub fn segment(&self, index: usize) -> &str {
        &self.0[index]
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_upper_cases() {
        assert_eq!(normalize_ident("reports").unwrap(), "REPORTS");
        assert_eq!(normalize_ident(" analytics ").unwrap(), "ANALYTICS");
        assert_eq!(normalize_ident("_tmp$1").unwrap(), "_TMP$1");
    }

    #[test]
    fn normalize_rejects_unquotable_names() {
        assert!(normalize_ident("").is_err());
        assert!(normalize_ident("my table").is_err());
        assert!(normalize_ident("1st").is_err());
        assert!(normalize_ident("a;drop database x").is_err());
        assert!(normalize_ident("\"foo\"").is_err());
    }

    #[test]
    fn privileges_allow_spaces() {
        assert_eq!(normalize_privilege("create table").unwrap(), "CREATE TABLE");
        assert!(normalize_privilege("select;").is_err());
    }

    #[test]
    fn column_types_allow_precision() {
        assert_eq!(
            normalize_column_type("number(38,0)").unwrap(),
            "NUMBER(38,0)"
        );
        assert!(normalize_column_type("int; drop table t").is_err());
    }

    #[test]
    fn escape_doubles_quotes() {
        assert_eq!(escape_literal("it's"), "it''s");
        assert_eq!(escape_literal(r"a\b"), r"a\\b");
    }

    #[test]
    fn id_round_trips_through_display() {
        let id = ObjectId::from_parts(&["analytics", "public", "events"]).unwrap();
        assert_eq!(id.to_string(), "ANALYTICS.PUBLIC.EVENTS");
        let parsed = ObjectId::parse("ANALYTICS.PUBLIC.EVENTS", 3).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_checks_segment_count() {
        assert!(ObjectId::parse("DB.SCHEMA", 3).is_err());
        assert!(ObjectId::parse("DB.SCHEMA.TABLE.EXTRA", 3).is_err());
    }

    #[test]
    fn parse_normalizes_case() {
        let id = ObjectId::parse("analytics.reports", 2).unwrap();
        assert_eq!(id.to_string(), "ANALYTICS.REPORTS");
    }
}
