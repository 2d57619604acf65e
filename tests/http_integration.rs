//! Integration tests for the SQL Admin fetch path using wiremock
//!
//! These tests run the fetcher and the data source read against mocked
//! endpoints, covering retries, not-found handling and pagination.

use gcp_sql_datasource::config::Config;
use gcp_sql_datasource::gcp::auth::GcpCredentials;
use gcp_sql_datasource::gcp::client::GcpClient;
use gcp_sql_datasource::gcp::retry::RetryPolicy;
use gcp_sql_datasource::resource::{
    fetch_databases, read_databases, FilterBlock, ReadOutcome, ReadRequest,
};
use gcp_sql_datasource::Error;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{bearer_token, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DATABASES_PATH: &str = "/sql/v1beta4/projects/test-project/instances/main/databases";

fn test_client(server: &MockServer, timeout: Duration) -> GcpClient {
    let config = Config {
        sql_custom_endpoint: Some(format!("{}/sql/v1beta4", server.uri())),
        user_agent: "gcp-sql-datasource/test".to_string(),
        ..Config::default()
    };
    GcpClient::with_credentials(&config, GcpCredentials::from_access_token("test-token"))
        .expect("client should build")
        .with_retry(
            RetryPolicy::with_timeout(timeout)
                .initial_delay(Duration::from_millis(5))
                .max_delay(Duration::from_millis(20)),
        )
}

fn database(name: &str) -> Value {
    json!({
        "kind": "sql#database",
        "charset": "UTF8",
        "collation": "en_US.UTF8",
        "name": name,
        "instance": "main",
        "project": "test-project",
        "selfLink": format!("https://sqladmin.googleapis.com/sql/v1beta4/projects/test-project/instances/main/databases/{}", name)
    })
}

fn api_error(code: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(code).set_body_json(json!({
        "error": {
            "code": code,
            "message": message
        }
    }))
}

/// Test module for fetcher integration tests
mod fetcher_tests {
    use super::*;

    /// Successful list returns databases in API order with auth headers set
    #[tokio::test]
    async fn test_list_returns_databases_in_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .and(bearer_token("test-token"))
            .and(header("user-agent", "gcp-sql-datasource/test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "sql#databasesList",
                "items": [database("postgres"), database("pg-db2"), database("pg-db1")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let databases = fetch_databases(&client, "test-project", "main")
            .await
            .expect("fetch should succeed");

        let names: Vec<_> = databases.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["postgres", "pg-db2", "pg-db1"]);
        assert_eq!(databases[1].charset, "UTF8");
    }

    /// A list response without items is an empty list
    #[tokio::test]
    async fn test_list_without_items() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"kind": "sql#databasesList"})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let databases = fetch_databases(&client, "test-project", "main").await.unwrap();
        assert!(databases.is_empty());
    }

    /// 409 "operation in progress" is retried until the list succeeds
    #[tokio::test]
    async fn test_operation_in_progress_is_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .respond_with(api_error(
                409,
                "Operation failed because another operation was already in progress.",
            ))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [database("pg-db1")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let databases = fetch_databases(&client, "test-project", "main").await.unwrap();
        assert_eq!(databases.len(), 1);
    }

    /// 503 is retried like an in-progress conflict
    #[tokio::test]
    async fn test_service_unavailable_is_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .respond_with(api_error(503, "Backend unavailable"))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [database("pg-db1"), database("pg-db2")]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let databases = fetch_databases(&client, "test-project", "main").await.unwrap();
        assert_eq!(databases.len(), 2);
    }

    /// A conflict that never clears becomes a terminal timeout
    #[tokio::test]
    async fn test_persistent_conflict_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .respond_with(api_error(409, "another operation was already in progress"))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_millis(100));
        let err = fetch_databases(&client, "test-project", "main")
            .await
            .unwrap_err();

        match err {
            Error::Timeout { last_error, .. } => {
                assert!(last_error.contains("already in progress"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// A response held past the read timeout is cut off and reported as a timeout
    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"items": [database("pg-db1")]}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = fetch_databases(&client, "test-project", "main")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout { .. }), "unexpected error: {err:?}");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    /// Later pages share the deadline of the first one
    #[tokio::test]
    async fn test_pagination_shares_one_deadline() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .and(query_param("pageToken", "token-page-2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"items": [database("db-2")]}))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "items": [database("db-1")],
                        "nextPageToken": "token-page-2"
                    }))
                    .set_delay(Duration::from_millis(300)),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;

        // Each page fits alone; both together do not
        let client = test_client(&server, Duration::from_millis(450));
        let err = fetch_databases(&client, "test-project", "main")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout { .. }), "unexpected error: {err:?}");
    }

    /// 403 is permanent and sent exactly once
    #[tokio::test]
    async fn test_permission_denied_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .respond_with(api_error(403, "Permission denied"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let err = fetch_databases(&client, "test-project", "main")
            .await
            .unwrap_err();

        match err {
            Error::Api { status, message } => {
                assert_eq!(status.as_u16(), 403);
                assert_eq!(message, "Permission denied");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Pagination follows nextPageToken
    #[tokio::test]
    async fn test_pagination_with_next_page_token() {
        let server = MockServer::start().await;

        // First page
        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [database("db-1"), database("db-2")],
                "nextPageToken": "token-page-2"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        // Second page
        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .and(query_param("pageToken", "token-page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [database("db-3")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let databases = fetch_databases(&client, "test-project", "main").await.unwrap();

        let names: Vec<_> = databases.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["db-1", "db-2", "db-3"]);
    }
}

/// Test module for the data source read
mod read_tests {
    use super::*;

    /// 404 marks the data source missing instead of failing
    #[tokio::test]
    async fn test_missing_instance_is_missing_outcome() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .respond_with(api_error(404, "The Cloud SQL instance does not exist."))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let request = ReadRequest::new("main").project("test-project");
        let outcome = read_databases(&client, None, &request).await.unwrap();

        assert_eq!(outcome, ReadOutcome::Missing);
    }

    /// An instance without databases reads as an empty list, not missing
    #[tokio::test]
    async fn test_empty_instance_reads_empty_list() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let request = ReadRequest::new("main");
        let state = read_databases(&client, Some("test-project"), &request)
            .await
            .unwrap()
            .into_state()
            .expect("data source should be present");

        assert!(state.databases.is_empty());
        assert_eq!(state.id, "projects/test-project/instances/main/101");
        assert_eq!(
            serde_json::to_value(&state).unwrap()["databases"],
            json!([])
        );
    }

    /// An unknown filter field fails the read once there are databases to filter
    #[tokio::test]
    async fn test_unknown_filter_field_fails_read() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DATABASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [database("pg-db1")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let request = ReadRequest::new("main")
            .project("test-project")
            .filter(FilterBlock::new("region").values(["us"]));
        let err = read_databases(&client, None, &request).await.unwrap_err();

        assert!(matches!(err, Error::UnknownFilterField(ref f) if f == "region"));
    }

    /// Missing project is a configuration error and no request is sent
    #[tokio::test]
    async fn test_missing_project_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let err = read_databases(&client, None, &ReadRequest::new("main"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingProject));
    }
}
