//! Snowflake backend for Tundra
//!
//! Translates declared configuration for warehouse objects into the SQL
//! statements that bring the live catalog into line, and reads catalog state
//! back into the same shape for drift detection.
//!
//! ```no_run
//! use tundra_core::config::CredentialsBlob;
//! use tundra_core::provider::{Provider, ProviderClient};
//! use tundra_snowflake::SnowflakeProvider;
//!
//! let credentials = CredentialsBlob::from_env("SNOWFLAKE_").unwrap();
//! let snow = SnowflakeProvider::new(&credentials, Some(ProviderClient::Core)).unwrap();
//! ```

mod catalog;
mod consts;
mod creds;
mod exists;
mod ident;
pub mod mock;
mod resources;
mod rest;
mod row_types;
mod session;
mod stmt;

pub use exists::{object_exists, Existence, ObjectKind, Scope};
pub use ident::{
    escape_literal, normalize_ident, normalize_privilege, ObjectId,
};
pub use resources::*;
pub use row_types::*;
pub use session::{QueryData, Session};
pub use stmt::strip_view_prefix;

use std::collections::HashSet;
use std::iter::zip;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use structmap::{value::Value, FromMap, GenericMap};
use tracing::error;

use tundra_core::config::CredentialsBlob;
use tundra_core::provider::{Provider, ProviderClient};

use rest::{SnowflakeRestClient, SnowflakeRestConfig};

/// The main Snowflake backend struct.
///
/// Holds the session every reconcile operation runs through. The
/// per-object-kind operations (`create_database`, `read_table`,
/// `update_user`, ...) are implemented in the `resources` modules.
pub struct SnowflakeProvider {
    session: Box<dyn Session>,
}

impl SnowflakeProvider {
    /// Build a provider around an already-open session. This is how tests
    /// drive reconcilers against a scripted [`mock::MockSession`].
    pub fn with_session(session: Box<dyn Session>) -> Self {
        Self { session }
    }

    pub(crate) fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }
}

#[async_trait]
impl Provider for SnowflakeProvider {
    /// Validates the credentials and bootstraps a Snowflake session.
    ///
    /// Validates that the required fields are present to authenticate to
    /// Snowflake. Stashes the credentials in the struct for use when
    /// connecting.
    fn new(credentials: &CredentialsBlob, client: Option<ProviderClient>) -> Result<Box<Self>> {
        let mut conn = creds::SnowflakeCredentials::default();
        let mut required_fields: HashSet<_> = vec![
            "account",
            "role",
            "user",
            "warehouse",
            "private_key",
            "public_key_fp",
            // "url" // URL not required – defaults to typical account URL.
        ]
        .into_iter()
        .collect();

        for (k, v) in credentials.iter() {
            match k.as_str() {
                "account" => conn.account = v.to_string(),
                "role" => conn.role = v.to_string(),
                "user" => conn.user = v.to_string(),
                "warehouse" => conn.warehouse = v.to_string(),
                "private_key" => conn.private_key = v.to_string(),
                "public_key_fp" => conn.public_key_fp = v.to_string(),
                "url" => conn.url = Some(v.to_string()),
                _ => (),
            }

            required_fields.remove(k.as_str());
        }

        if !required_fields.is_empty() {
            Err(anyhow![
                "Snowflake config missing required fields: {:#?}",
                required_fields
            ])
        } else {
            let client = client.unwrap_or(ProviderClient::Core);
            let rest_client = SnowflakeRestClient::new(
                conn,
                SnowflakeRestConfig {
                    retry: true,
                    use_jwt: client != ProviderClient::Test,
                },
            )?;
            Ok(Box::new(SnowflakeProvider {
                session: Box::new(rest_client),
            }))
        }
    }

    async fn check(&self) -> bool {
        let res = self.session.execute("SELECT 1").await;
        match res {
            Err(e) => {
                error!("{:?}", e);
                false
            }
            Ok(_) => true,
        }
    }
}

/// Marshal query output into typed rows by column name. Field names are
/// lower-cased first so SHOW output (lower-case names) and
/// information-schema output (upper-case names) land in the same structs.
pub(crate) fn from_rows<T: FromMap>(data: &QueryData) -> Vec<T> {
    let fields: Vec<String> = data.fields.iter().map(|f| f.to_lowercase()).collect();
    data.rows
        .iter()
        .map(|row| {
            let map: GenericMap = zip(
                fields.clone(),
                row.iter().map(|value| Value::new(value.clone())),
            )
            .collect();
            T::from_genericmap(map)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_fields_fail_construction() {
        let blob = CredentialsBlob::from_pairs([("account", "acct"), ("role", "SYSADMIN")]);
        assert!(SnowflakeProvider::new(&blob, Some(ProviderClient::Test)).is_err());
    }

    #[test]
    fn complete_credentials_construct_a_provider() {
        let blob = CredentialsBlob::from_pairs([
            ("account", "acct"),
            ("role", "SYSADMIN"),
            ("user", "tundra"),
            ("warehouse", "main"),
            ("private_key", "key"),
            ("public_key_fp", "fp"),
        ]);
        SnowflakeProvider::new(&blob, Some(ProviderClient::Test)).unwrap();
    }

    #[test]
    fn from_rows_is_case_insensitive_on_field_names() {
        let data = QueryData {
            fields: vec!["NAME".to_owned(), "COMMENT".to_owned()],
            rows: vec![vec!["REPORTS".to_owned(), "prod".to_owned()]],
        };
        let rows: Vec<crate::row_types::DatabaseRow> = from_rows(&data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "REPORTS");
        assert_eq!(rows[0].comment, "prod");
    }
}
