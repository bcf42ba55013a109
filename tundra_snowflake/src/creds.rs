use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Credentials for authenticating to Snowflake.
///
/// The host's configuration step assembles these from its secret source
/// (typically environment variables) and hands them over as a blob.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct SnowflakeCredentials {
    pub(crate) account: String,
    pub(crate) role: String,
    pub(crate) user: String,
    pub(crate) warehouse: String,
    pub(crate) private_key: String,
    pub(crate) public_key_fp: String,
    pub(crate) url: Option<String>,
}

impl SnowflakeCredentials {
    /// Perform simple field validation to catch bad input.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.account.is_empty()
            || self.role.is_empty()
            || self.user.is_empty()
            || self.warehouse.is_empty()
            || self.private_key.is_empty()
            || self.public_key_fp.is_empty()
        {
            return Err(anyhow!(
                "Credentials are missing. Please make sure your credentials are complete. Credentials received: {:#?}",
                self
            ));
        }
        Ok(())
    }
}
