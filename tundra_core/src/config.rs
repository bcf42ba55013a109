//! Credentials plumbing shared by backends.
//!
//! The host's configuration step owns where secrets come from; this module
//! only defines the blob shape handed to a backend and a helper that sources
//! it from the environment.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use serde::Deserialize;

/// An untyped map of credential fields. Each backend validates the fields it
/// needs out of the blob when it is constructed.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CredentialsBlob(HashMap<String, String>);

impl CredentialsBlob {
    /// Build a blob from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Collect every environment variable starting with `prefix` into a
    /// blob, keyed by the lower-cased remainder of the variable name
    /// (`SNOWFLAKE_ACCOUNT` with prefix `SNOWFLAKE_` becomes `account`).
    pub fn from_env(prefix: &str) -> Result<Self> {
        let fields: HashMap<String, String> = std::env::vars()
            .filter_map(|(k, v)| {
                k.strip_prefix(prefix)
                    .map(|rest| (rest.to_lowercase(), v))
            })
            .collect();
        if fields.is_empty() {
            return Err(anyhow!(
                "no credentials found in the environment under the {} prefix",
                prefix
            ));
        }
        Ok(Self(fields))
    }

    /// Iterate over the credential fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Look up a single field.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.0.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pairs_round_trips() {
        let blob = CredentialsBlob::from_pairs([("account", "org-acct"), ("role", "SYSADMIN")]);
        assert_eq!(blob.get("account").unwrap(), "org-acct");
        assert_eq!(blob.get("role").unwrap(), "SYSADMIN");
        assert_eq!(blob.iter().count(), 2);
    }

    #[test]
    fn missing_field_is_none() {
        let blob = CredentialsBlob::default();
        assert!(blob.get("account").is_none());
    }
}
