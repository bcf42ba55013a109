//! Error taxonomy for reconciler operations.
//!
//! Every reconciler operation returns the first error it hits and stops.
//! Partial progress from a multi-statement update is not rolled back; the
//! already-applied sub-changes stay in effect and are picked up again on the
//! next reconciliation pass.

use thiserror::Error;

/// The errors a reconciler operation can surface to the host.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The referenced object is absent where presence was required (a read
    /// of a pruned object, a delete of an already-gone object). The host
    /// prunes the object from state in response.
    #[error("{kind} {name} does not exist")]
    NotFound {
        /// Object kind, for the message ("database", "user", ...).
        kind: &'static str,
        /// The name or dotted identity that failed to resolve.
        name: String,
    },

    /// More than one remote object matched a name/scope filter. Unquoted
    /// identifiers are case-insensitive, but quoted ones are not, so two
    /// distinct remote objects can collide under case normalization. Always
    /// fatal, never auto-resolved.
    #[error("more than 1 row returned for \"{statement}\"")]
    Ambiguous {
        /// The listing statement that matched multiple rows.
        statement: String,
    },

    /// A rename or create target already exists. Raised before any mutating
    /// statement executes.
    #[error("cannot rename {from} to {to}, {to} already exists")]
    Conflict {
        /// Current identity.
        from: String,
        /// Requested target identity.
        to: String,
    },

    /// A locally detectable contradiction in the desired state. Raised
    /// before any statement is sent.
    #[error("invalid desired state: {0}")]
    Validation(String),

    /// Underlying execution or connection failure, propagated unchanged.
    /// The caller owns retry policy; nothing is retried here.
    #[error(transparent)]
    Driver(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_object() {
        let e = ReconcileError::NotFound {
            kind: "database",
            name: "REPORTS".to_owned(),
        };
        assert_eq!(e.to_string(), "database REPORTS does not exist");
    }

    #[test]
    fn conflict_message_names_both_ends() {
        let e = ReconcileError::Conflict {
            from: "A".to_owned(),
            to: "B".to_owned(),
        };
        assert_eq!(e.to_string(), "cannot rename A to B, B already exists");
    }

    #[test]
    fn driver_errors_pass_through() {
        let source = anyhow::anyhow!("boom");
        let e: ReconcileError = source.into();
        assert!(matches!(e, ReconcileError::Driver(_)));
        assert_eq!(e.to_string(), "boom");
    }
}
