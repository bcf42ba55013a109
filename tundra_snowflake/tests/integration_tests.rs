use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tundra_core::config::CredentialsBlob;
use tundra_core::provider::{Provider, ProviderClient};
use tundra_core::ReconcileError;
use tundra_snowflake::mock::MockSession;
use tundra_snowflake::{
    DatabaseState, GrantState, Grantee, ObjectId, QueryData, SnowflakeProvider,
};

fn database_listing(name: &str, comment: &str, retention: &str) -> QueryData {
    QueryData {
        fields: [
            "created_on",
            "name",
            "is_default",
            "is_current",
            "origin",
            "owner",
            "comment",
            "options",
            "retention_time",
        ]
        .iter()
        .map(|f| f.to_string())
        .collect(),
        rows: vec![vec![
            "2024-01-01".to_owned(),
            name.to_owned(),
            "N".to_owned(),
            "N".to_owned(),
            "".to_owned(),
            "SYSADMIN".to_owned(),
            comment.to_owned(),
            "".to_owned(),
            retention.to_owned(),
        ]],
    }
}

fn provider_with(session: Arc<MockSession>) -> SnowflakeProvider {
    SnowflakeProvider::with_session(Box::new(session))
}

#[tokio::test]
async fn read_after_create_returns_the_normalized_desired_state() {
    let session = Arc::new(
        MockSession::new()
            .respond("SHOW DATABASES LIKE 'REPORTS'", database_listing("REPORTS", "prod", "5")),
    );
    let provider = provider_with(session.clone());

    let desired = DatabaseState {
        name: "reports".to_owned(),
        comment: "prod".to_owned(),
        retention_time: 5,
        ..Default::default()
    };
    let id = provider.create_database(&desired).await.unwrap();
    assert_eq!(id.to_string(), "REPORTS");

    let live = provider.read_database(&id).await.unwrap();
    assert_eq!(live.name, "REPORTS");
    assert_eq!(live.comment, desired.comment);
    assert_eq!(live.retention_time, desired.retention_time);
    assert!(!live.transient);
}

#[tokio::test]
async fn import_of_a_differently_cased_id_matches_the_created_identity() {
    let session = Arc::new(
        MockSession::new()
            .respond("SHOW DATABASES LIKE 'REPORTS'", database_listing("REPORTS", "", "0")),
    );
    let provider = provider_with(session.clone());

    let created = provider
        .create_database(&DatabaseState {
            name: "reports".to_owned(),
            ..Default::default()
        })
        .await
        .unwrap();
    let (imported, state) = provider.import_database("Reports").await.unwrap();
    assert_eq!(created, imported);
    assert_eq!(state.name, "REPORTS");
}

#[tokio::test]
async fn an_ambiguous_name_stops_every_operation_before_mutating() {
    let two_rows = QueryData {
        fields: vec!["name".to_owned()],
        rows: vec![vec!["foo".to_owned()], vec!["FOO".to_owned()]],
    };
    let session = Arc::new(MockSession::new().respond("SHOW DATABASES LIKE", two_rows));
    let provider = provider_with(session.clone());
    let id = ObjectId::from_parts(&["FOO"]).unwrap();

    let read_err = provider.read_database(&id).await.unwrap_err();
    assert!(matches!(read_err, ReconcileError::Ambiguous { .. }));

    let mut update_id = id.clone();
    let mut prior = DatabaseState {
        name: "FOO".to_owned(),
        ..Default::default()
    };
    let desired = DatabaseState {
        name: "FOO".to_owned(),
        comment: "new".to_owned(),
        ..Default::default()
    };
    let update_err = provider
        .update_database(&mut update_id, &mut prior, &desired)
        .await
        .unwrap_err();
    assert!(matches!(update_err, ReconcileError::Ambiguous { .. }));

    let delete_err = provider.delete_database(&id).await.unwrap_err();
    assert!(matches!(delete_err, ReconcileError::Ambiguous { .. }));

    // Not one mutating statement went out.
    assert!(session.executed().is_empty());
}

#[tokio::test]
async fn rename_runs_first_and_later_statements_use_the_new_name() {
    let session = Arc::new(
        MockSession::new()
            .respond("SHOW DATABASES LIKE 'REPORTS'", database_listing("REPORTS", "", "0")),
    );
    let provider = provider_with(session.clone());

    let mut id = ObjectId::from_parts(&["REPORTS"]).unwrap();
    let mut prior = DatabaseState {
        name: "REPORTS".to_owned(),
        ..Default::default()
    };
    let desired = DatabaseState {
        name: "reports_v2".to_owned(),
        comment: "prod".to_owned(),
        ..Default::default()
    };
    provider
        .update_database(&mut id, &mut prior, &desired)
        .await
        .unwrap();

    assert_eq!(
        session.executed(),
        vec![
            "ALTER DATABASE REPORTS RENAME TO REPORTS_V2",
            "ALTER DATABASE REPORTS_V2 SET COMMENT = 'prod'",
        ]
    );
    assert_eq!(id.to_string(), "REPORTS_V2");
}

#[tokio::test]
async fn a_mid_sequence_failure_keeps_earlier_changes_and_skips_later_ones() {
    let session = Arc::new(
        MockSession::new()
            .respond("SHOW DATABASES LIKE 'REPORTS'", database_listing("REPORTS", "", "0"))
            .fail_execute("SET COMMENT"),
    );
    let provider = provider_with(session.clone());

    let mut id = ObjectId::from_parts(&["REPORTS"]).unwrap();
    let mut prior = DatabaseState {
        name: "REPORTS".to_owned(),
        retention_time: 0,
        ..Default::default()
    };
    let desired = DatabaseState {
        name: "reports_v2".to_owned(),
        comment: "prod".to_owned(),
        retention_time: 7,
        ..Default::default()
    };
    let err = provider
        .update_database(&mut id, &mut prior, &desired)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Driver(_)));

    // The rename applied and was checkpointed.
    assert_eq!(session.executed(), vec!["ALTER DATABASE REPORTS RENAME TO REPORTS_V2"]);
    assert_eq!(id.to_string(), "REPORTS_V2");
    assert_eq!(prior.name, "REPORTS_V2");
    // The failed comment change was not checkpointed.
    assert_eq!(prior.comment, "");
    // The retention change was never attempted.
    assert!(!session
        .statements()
        .iter()
        .any(|s| s.contains("DATA_RETENTION_TIME_IN_DAYS")));
}

#[tokio::test]
async fn grant_on_all_tables_expands_to_the_schema_form() {
    let session = Arc::new(MockSession::new());
    let provider = provider_with(session.clone());

    let desired = GrantState {
        database: "analytics".to_owned(),
        schema: "public".to_owned(),
        object: "ALL".to_owned(),
        privileges: vec!["select".to_owned()],
        grantee: Grantee::Role("loader".to_owned()),
    };
    let id = provider.create_table_grant(&desired).await.unwrap();
    assert_eq!(id.to_string(), "LOADER.ANALYTICS.PUBLIC.ALL.SELECT");
    assert_eq!(
        session.executed(),
        vec!["GRANT SELECT ON ALL TABLES IN ANALYTICS.PUBLIC TO ROLE LOADER"]
    );
}

// -- REST-backed flows against a mocked statement endpoint --

fn rest_credentials(url: String) -> CredentialsBlob {
    CredentialsBlob::from_pairs([
        ("account", "my_account".to_owned()),
        ("role", "SYSADMIN".to_owned()),
        ("user", "tundra".to_owned()),
        ("warehouse", "main".to_owned()),
        ("private_key", "unused_in_tests".to_owned()),
        ("public_key_fp", "unused_in_tests".to_owned()),
        ("url", url),
    ])
}

fn statement_result(fields: &[&str], rows: Vec<Vec<&str>>) -> String {
    json!({
        "resultSetMetaData": {
            "rowType": fields.iter().map(|f| json!({ "name": f })).collect::<Vec<_>>(),
        },
        "data": rows,
    })
    .to_string()
}

#[tokio::test]
async fn create_and_read_a_database_over_the_statement_api() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/statements"))
        .and(body_string_contains("CREATE DATABASE REPORTS"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v2/statements"))
        .and(body_string_contains("SHOW DATABASES LIKE 'REPORTS'"))
        .respond_with(ResponseTemplate::new(200).set_body_string(statement_result(
            &[
                "created_on",
                "name",
                "is_default",
                "is_current",
                "origin",
                "owner",
                "comment",
                "options",
                "retention_time",
            ],
            vec![vec![
                "2024-01-01",
                "REPORTS",
                "N",
                "N",
                "",
                "SYSADMIN",
                "prod",
                "",
                "5",
            ]],
        )))
        .mount(&server)
        .await;

    let credentials = rest_credentials(format!("{}/api/v2/statements", server.uri()));
    let provider = SnowflakeProvider::new(&credentials, Some(ProviderClient::Test)).unwrap();

    let id = provider
        .create_database(&DatabaseState {
            name: "reports".to_owned(),
            comment: "prod".to_owned(),
            retention_time: 5,
            ..Default::default()
        })
        .await
        .unwrap();

    let live = provider.read_database(&id).await.unwrap();
    assert_eq!(live.name, "REPORTS");
    assert_eq!(live.comment, "prod");
    assert_eq!(live.retention_time, 5);
    assert_eq!(live.owner, "SYSADMIN");
}

#[tokio::test]
async fn check_reports_connection_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/statements"))
        .and(body_string_contains("SELECT 1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let credentials = rest_credentials(format!("{}/api/v2/statements", server.uri()));
    let provider = SnowflakeProvider::new(&credentials, Some(ProviderClient::Test)).unwrap();
    assert!(provider.check().await);
}
