//! Rest API interface for Snowflake
//!

use crate::{
    consts,
    creds::SnowflakeCredentials,
    session::{QueryData, Session},
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use std::collections::HashMap;

/// Claims for use with the `jsonwebtoken` crate when
/// creating a new JWT.
#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    /// Required (validate_exp defaults to true in validation). Expiration time (as UTC timestamp)
    exp: usize,
    /// Optional. Issued at (as UTC timestamp)
    iat: usize,
    /// Optional. Issuer
    iss: String,
    /// Optional. Subject (whom token refers to)
    sub: String,
}

/// One column descriptor in the statement-API result metadata.
#[derive(Deserialize, Debug)]
struct SnowflakeField {
    #[serde(default)]
    name: String,
}

pub(crate) struct SnowflakeRestConfig {
    /// Enable/disable transport-level retry of failed request dispatch.
    pub(crate) retry: bool,
    /// Sign requests with a key-pair JWT. Test clients run unsigned against
    /// a mock endpoint.
    pub(crate) use_jwt: bool,
}

impl Default for SnowflakeRestConfig {
    fn default() -> Self {
        Self {
            retry: true,
            use_jwt: true,
        }
    }
}

/// Wrapper struct for http functionality
pub(crate) struct SnowflakeRestClient {
    /// The credentials used to authenticate into Snowflake.
    credentials: SnowflakeCredentials,
    http_client: ClientWithMiddleware,
    use_jwt: bool,
}

impl SnowflakeRestClient {
    pub(crate) fn new(
        credentials: SnowflakeCredentials,
        config: SnowflakeRestConfig,
    ) -> Result<Self> {
        credentials.validate()?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let mut client_builder = ClientBuilder::new(reqwest::Client::new());
        if config.retry {
            client_builder =
                client_builder.with(RetryTransientMiddleware::new_with_policy(retry_policy))
        }
        let client = client_builder.build();
        Ok(Self {
            credentials,
            http_client: client,
            use_jwt: config.use_jwt,
        })
    }

    /// If the URL is explicitly defined, that's used first.
    /// Otherwise, the standard account configuration
    /// is used
    fn get_url(&self) -> String {
        self.credentials.url.to_owned().unwrap_or_else(|| {
            format![
                "https://{}.snowflakecomputing.com/api/v2/statements",
                self.credentials.account
            ]
        })
    }

    fn get_request(&self, sql: &str) -> Result<RequestBuilder> {
        let token = self.get_jwt()?;
        let body = self.get_body(sql);

        Ok(self
            .http_client
            .post(self.get_url())
            .json(&body)
            .header(consts::AUTH_HEADER, format!["Bearer {}", token])
            .header(consts::CONTENT_TYPE_HEADER, "application/json")
            .header(consts::ACCEPT_HEADER, "application/json")
            .header(consts::SNOWFLAKE_AUTH_HEADER, "KEYPAIR_JWT")
            .header(consts::USER_AGENT_HEADER, "tundra"))
    }

    fn get_body<'a>(&'a self, sql: &'a str) -> HashMap<&str, &'a str> {
        let mut body = HashMap::new();
        body.insert("statement", sql);
        body.insert("warehouse", self.credentials.warehouse.as_str());
        body.insert("role", &self.credentials.role);
        body
    }

    fn get_jwt(&self) -> Result<String> {
        if !self.use_jwt {
            return Ok("UNSIGNED".to_owned());
        }

        let qualified_username = format![
            "{}.{}",
            self.credentials.account.to_uppercase(),
            self.credentials.user.to_uppercase()
        ];

        // Generate jwt
        let claims = JwtClaims {
            exp: (get_current_timestamp() + 3600) as usize,
            iat: get_current_timestamp() as usize,
            iss: format!["{}.{}", qualified_username, self.credentials.public_key_fp],
            sub: qualified_username,
        };

        encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &EncodingKey::from_rsa_pem(
                self.credentials
                    .private_key
                    .replace(' ', "")
                    .replace("ENDPRIVATEKEY", "END PRIVATE KEY")
                    .replace("BEGINPRIVATEKEY", "BEGIN PRIVATE KEY")
                    .as_bytes(),
            )?,
        )
        .map_err(anyhow::Error::from)
    }
}

#[async_trait]
impl Session for SnowflakeRestClient {
    /// Execute a query, dropping the result.
    async fn execute(&self, sql: &str) -> Result<()> {
        let request = self.get_request(sql)?;
        request
            .send()
            .await
            .context("couldn't send request")?
            .error_for_status()?;
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<QueryData> {
        let request = self
            .get_request(sql)
            .context("failed to get request for query")?;

        let response = request
            .send()
            .await
            .context("couldn't send request")?
            .error_for_status()?;
        let body = response.text().await.context("couldn't get body text")?;
        parse_query_data(&body)
    }
}

/// Parse the statement-API response body into field names and stringified
/// rows. Null cells come back as empty strings.
fn parse_query_data(body: &str) -> Result<QueryData> {
    if body.is_empty() {
        return Ok(QueryData::default());
    }
    let payload: JsonValue = serde_json::from_str(body).context("failed to deserialize")?;
    if let Some(info) = payload.get("partitionInfo") {
        bail!("unexpected partitioned return value: {}", info);
    }
    let rows: Vec<Vec<Option<String>>> = serde_json::from_value(payload["data"].clone())
        .context("failed to deserialize rows")?;
    let fields_intermediate: Vec<SnowflakeField> =
        serde_json::from_value(payload["resultSetMetaData"]["rowType"].clone())
            .context("failed to deserialize fields")?;
    Ok(QueryData {
        fields: fields_intermediate.into_iter().map(|f| f.name).collect(),
        rows: rows
            .into_iter()
            .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_creds(url: Option<String>) -> SnowflakeCredentials {
        SnowflakeCredentials {
            account: "my_account".to_owned(),
            role: "role".to_owned(),
            user: "user".to_owned(),
            warehouse: "warehouse".to_owned(),
            private_key: "private_key".to_owned(),
            public_key_fp: "fp".to_owned(),
            url,
        }
    }

    fn unsigned_config() -> SnowflakeRestConfig {
        SnowflakeRestConfig {
            retry: false,
            use_jwt: false,
        }
    }

    #[test]
    fn empty_creds_fail_to_load() {
        assert!(
            SnowflakeRestClient::new(SnowflakeCredentials::default(), unsigned_config()).is_err()
        );
    }

    #[test]
    fn filled_creds_create_client_successfully() {
        SnowflakeRestClient::new(test_creds(None), unsigned_config()).unwrap();
    }

    #[tokio::test]
    async fn execute_hits_the_statement_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/statements"))
            .and(body_string_contains("select 1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"text": "ok"}"#))
            .mount(&server)
            .await;

        let creds = test_creds(Some(format!("{}/api/v2/statements", server.uri())));
        let client = SnowflakeRestClient::new(creds, unsigned_config()).unwrap();
        client.execute("select 1").await.unwrap();
    }

    #[tokio::test]
    async fn server_error_surfaces_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/statements"))
            .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"text": "boom"}"#))
            .mount(&server)
            .await;

        let creds = test_creds(Some(format!("{}/api/v2/statements", server.uri())));
        let client = SnowflakeRestClient::new(creds, unsigned_config()).unwrap();
        assert!(client.query("select 2").await.is_err());
    }

    #[test]
    fn parse_query_data_reads_fields_and_rows() {
        let body = r#"{
            "resultSetMetaData": {"rowType": [{"name": "name"}, {"name": "comment"}]},
            "data": [["REPORTS", null], ["STAGING", "scratch"]]
        }"#;
        let data = parse_query_data(body).unwrap();
        assert_eq!(data.fields, vec!["name", "comment"]);
        assert_eq!(
            data.rows,
            vec![
                vec!["REPORTS".to_owned(), "".to_owned()],
                vec!["STAGING".to_owned(), "scratch".to_owned()],
            ]
        );
    }

    #[test]
    fn parse_query_data_empty_body_is_empty() {
        let data = parse_query_data("").unwrap();
        assert!(data.fields.is_empty());
        assert!(data.rows.is_empty());
    }

    #[test]
    fn parse_query_data_rejects_partitioned_results() {
        let body = r#"{
            "resultSetMetaData": {"rowType": []},
            "data": [],
            "partitionInfo": [{"rowCount": 5}]
        }"#;
        assert!(parse_query_data(body).is_err());
    }
}
