//! User reconciliation.
//!
//! The RSA public key never round-trips: DESC USER reports only its
//! fingerprint, so declared keys are stored and compared as fingerprints
//! and the raw key is sent only when it actually changed.

use sha2::{Digest, Sha256};

use tundra_core::schema::{AttributeKind, AttributeSpec};
use tundra_core::ReconcileError;

use crate::catalog;
use crate::exists::{object_exists, Existence, ObjectKind, Scope};
use crate::ident::{self, normalize_ident, ObjectId};
use crate::stmt;
use crate::SnowflakeProvider;

/// Declared and observed user attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserState {
    pub name: String,
    pub login_name: String,
    pub email: String,
    pub must_change_password: bool,
    pub default_role: String,
    pub default_warehouse: String,
    /// Declared as the raw key; held in state as its SHA-256 fingerprint.
    pub rsa_public_key: String,
}

/// The attribute surface users expose to the host.
pub static USER_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec {
        name: "name",
        kind: AttributeKind::Required,
        force_new: false,
        default: None,
        normalize: Some(ident::upper),
    },
    AttributeSpec {
        name: "login_name",
        kind: AttributeKind::Optional,
        force_new: false,
        default: None,
        normalize: Some(ident::upper),
    },
    AttributeSpec {
        name: "email",
        kind: AttributeKind::Optional,
        force_new: false,
        default: None,
        normalize: Some(ident::upper),
    },
    AttributeSpec {
        name: "must_change_password",
        kind: AttributeKind::Optional,
        force_new: false,
        default: Some("false"),
        normalize: None,
    },
    AttributeSpec {
        name: "default_role",
        kind: AttributeKind::Optional,
        force_new: false,
        default: None,
        normalize: None,
    },
    AttributeSpec {
        name: "default_warehouse",
        kind: AttributeKind::Optional,
        force_new: false,
        default: None,
        normalize: None,
    },
    AttributeSpec {
        name: "rsa_public_key",
        kind: AttributeKind::Optional,
        force_new: false,
        default: None,
        normalize: Some(key_fingerprint),
    },
];

/// Fingerprint a base64-encoded public key the way the catalog reports it:
/// `SHA256:<base64 of the digest>`.
pub fn key_fingerprint(key: &str) -> String {
    let key_bytes = base64::decode(key).unwrap_or_default();
    let digest = Sha256::digest(&key_bytes);
    format!("SHA256:{}", base64::encode(digest))
}

impl SnowflakeProvider {
    /// Create the user and return its identity.
    pub async fn create_user(&self, desired: &UserState) -> Result<ObjectId, ReconcileError> {
        let statement = stmt::create_user(desired)?;
        self.session().execute(&statement).await?;
        ObjectId::from_parts(&[&desired.name])
    }

    /// Read the live user behind `id` back into state shape.
    pub async fn read_user(&self, id: &ObjectId) -> Result<UserState, ReconcileError> {
        let props = catalog::describe_user(self.session(), id.segment(0)).await?;
        Ok(UserState {
            name: props.name,
            login_name: props.login_name,
            email: props.email,
            must_change_password: props.must_change_password.eq_ignore_ascii_case("true"),
            default_role: props.default_role,
            default_warehouse: props.default_warehouse,
            rsa_public_key: props.rsa_public_key_fp,
        })
    }

    /// Apply the changed attributes, one statement each, rename first.
    pub async fn update_user(
        &self,
        id: &mut ObjectId,
        prior: &mut UserState,
        desired: &UserState,
    ) -> Result<(), ReconcileError> {
        let current = id.segment(0).to_owned();
        match object_exists(self.session(), ObjectKind::User, &current, &Scope::Account).await? {
            Existence::Absent => {
                return Err(ReconcileError::NotFound {
                    kind: "user",
                    name: current,
                })
            }
            Existence::Unique => {}
        }

        let target = normalize_ident(&desired.name)?;
        if target != current {
            // Check that the rename target does not exist.
            if let Existence::Unique =
                object_exists(self.session(), ObjectKind::User, &target, &Scope::Account).await?
            {
                return Err(ReconcileError::Conflict {
                    from: current,
                    to: target,
                });
            }
            self.session()
                .execute(&stmt::rename_user(&current, &target)?)
                .await?;
            *id = ObjectId::from_parts(&[&target])?;
            prior.name = target;
        }
        if prior.email != desired.email {
            self.session()
                .execute(&stmt::set_user_property(
                    id.segment(0),
                    "EMAIL",
                    &desired.email,
                )?)
                .await?;
            prior.email = desired.email.clone();
        }
        if prior.login_name != desired.login_name {
            self.session()
                .execute(&stmt::set_user_property(
                    id.segment(0),
                    "LOGIN_NAME",
                    &desired.login_name,
                )?)
                .await?;
            prior.login_name = desired.login_name.clone();
        }
        if prior.must_change_password != desired.must_change_password {
            self.session()
                .execute(&stmt::set_user_must_change_password(
                    id.segment(0),
                    desired.must_change_password,
                )?)
                .await?;
            prior.must_change_password = desired.must_change_password;
        }
        if prior.default_role != desired.default_role {
            self.session()
                .execute(&stmt::set_user_property(
                    id.segment(0),
                    "DEFAULT_ROLE",
                    &desired.default_role,
                )?)
                .await?;
            prior.default_role = desired.default_role.clone();
        }
        if prior.default_warehouse != desired.default_warehouse {
            self.session()
                .execute(&stmt::set_user_property(
                    id.segment(0),
                    "DEFAULT_WAREHOUSE",
                    &desired.default_warehouse,
                )?)
                .await?;
            prior.default_warehouse = desired.default_warehouse.clone();
        }
        // The prior side holds a fingerprint; fingerprint the declared key
        // to detect a change, but send the raw key.
        if !desired.rsa_public_key.is_empty()
            && key_fingerprint(&desired.rsa_public_key) != prior.rsa_public_key
        {
            self.session()
                .execute(&stmt::set_user_property(
                    id.segment(0),
                    "RSA_PUBLIC_KEY",
                    &desired.rsa_public_key,
                )?)
                .await?;
            prior.rsa_public_key = key_fingerprint(&desired.rsa_public_key);
        }
        Ok(())
    }

    /// Drop the user, verifying they still exist first.
    pub async fn delete_user(&self, id: &ObjectId) -> Result<(), ReconcileError> {
        let name = id.segment(0);
        match object_exists(self.session(), ObjectKind::User, name, &Scope::Account).await? {
            Existence::Absent => Err(ReconcileError::NotFound {
                kind: "user",
                name: name.to_owned(),
            }),
            Existence::Unique => {
                self.session().execute(&stmt::drop_user(name)?).await?;
                Ok(())
            }
        }
    }

    /// Adopt an existing user from an externally supplied id.
    pub async fn import_user(
        &self,
        raw_id: &str,
    ) -> Result<(ObjectId, UserState), ReconcileError> {
        let id = ObjectId::parse(raw_id, 1)?;
        let state = self.read_user(&id).await?;
        Ok((id, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::mock::MockSession;
    use crate::session::QueryData;

    #[test]
    fn fingerprint_is_stable_and_prefixed() {
        let fp = key_fingerprint("TUlJQklqQU5CZ2txaGtpRzl3MEJBUUVGQUFP");
        assert!(fp.starts_with("SHA256:"));
        assert_eq!(fp, key_fingerprint("TUlJQklqQU5CZ2txaGtpRzl3MEJBUUVGQUFP"));
    }

    #[tokio::test]
    async fn unchanged_key_issues_no_statement() {
        let unique = QueryData {
            fields: vec!["name".to_owned()],
            rows: vec![vec!["ETL_USER".to_owned()]],
        };
        let session = Arc::new(MockSession::new().respond("SHOW USERS LIKE", unique));
        let provider = SnowflakeProvider::with_session(Box::new(session.clone()));
        let mut id = ObjectId::from_parts(&["ETL_USER"]).unwrap();
        let raw_key = "TUlJQklqQU5CZ2txaGtpRzl3MEJBUUVGQUFP";
        let mut prior = UserState {
            name: "ETL_USER".to_owned(),
            rsa_public_key: key_fingerprint(raw_key),
            ..Default::default()
        };
        let desired = UserState {
            name: "ETL_USER".to_owned(),
            rsa_public_key: raw_key.to_owned(),
            ..Default::default()
        };
        provider
            .update_user(&mut id, &mut prior, &desired)
            .await
            .unwrap();
        assert!(session.executed().is_empty());
    }
}
