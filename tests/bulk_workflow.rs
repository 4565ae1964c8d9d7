//! End-to-end bulk ingest workflows against a mock Salesforce org.

use std::time::Duration;

use connectors::common::{
    BearerToken, BulkWriteSupport, ClientConfig, ErrorKind as ClientErrorKind, HttpClient, Provider,
    ProviderCatalog, ProviderInfo,
};
use connectors::salesforce::{
    is_done, BulkOperationMode, BulkOperationParams, BulkPhase, Connector, ErrorKind, JobState,
    SalesforceParams,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INGEST: &str = "/services/data/v59.0/jobs/ingest";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn connector(server: &MockServer, config: ClientConfig) -> Connector {
    let catalog = ProviderCatalog::builtin().with(
        Provider::SALESFORCE,
        ProviderInfo::new("Salesforce", server.uri()).with_bulk_write(BulkWriteSupport {
            insert: false,
            update: false,
            upsert: true,
            delete: true,
        }),
    );
    let http = HttpClient::new(config).unwrap();
    Connector::new(&catalog, SalesforceParams::new(http, BearerToken::new("00Dxx!token"))).unwrap()
}

fn delete_csv(rows: usize) -> String {
    let mut csv = String::from("Id\n");
    for i in 0..rows {
        csv.push_str(&format!("001xx00000{:05}\n", i));
    }
    csv
}

async fn mount_open_job(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(INGEST))
        .and(body_json(serde_json::json!({
            "object": "Account",
            "operation": "delete",
            "contentType": "CSV",
            "lineEnding": "LF"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": "750xx", "state": "Open"})),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_bulk_delete_with_partial_failure() {
    init_tracing();
    let server = MockServer::start().await;
    let csv = delete_csv(10);

    mount_open_job(&server).await;
    Mock::given(method("PUT"))
        .and(path(format!("{INGEST}/750xx/batches")))
        .and(header("Content-Type", "text/csv"))
        .and(body_string(csv.clone()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{INGEST}/750xx")))
        .and(body_json(serde_json::json!({"state": "UploadComplete"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": "750xx", "state": "UploadComplete"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{INGEST}/750xx")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "750xx",
            "object": "Account",
            "operation": "delete",
            "state": "InProgress",
            "numberRecordsProcessed": 4
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{INGEST}/750xx")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "750xx",
            "object": "Account",
            "operation": "delete",
            "state": "Failed",
            "numberRecordsProcessed": 10,
            "numberRecordsFailed": 3,
            "apiVersion": 59.0
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{INGEST}/750xx/failedResults")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "\"sf__Id\",\"sf__Error\"\n\
             \"\",\"MALFORMED_ID:malformed id:--\"\n\
             \"\",\"MALFORMED_ID:malformed id:--\"\n\
             \"001xx0000000003\",\"ENTITY_IS_DELETED:entity is deleted:--\"\n",
            "text/csv",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connector(&server, ClientConfig::default());
    let cancel = CancellationToken::new();

    let params = BulkOperationParams::new(
        "Account",
        BulkOperationMode::Delete,
        std::io::Cursor::new(csv.into_bytes()),
    );
    let job = conn.bulk_delete(&cancel, params).await.unwrap();
    assert_eq!(job.job_id, "750xx");
    assert_eq!(job.state, JobState::UploadComplete);

    let mut polls = 0;
    let info = loop {
        polls += 1;
        let info = conn.get_job_info(&cancel, &job.job_id).await.unwrap();
        if is_done(info.state) {
            break info;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    };
    assert_eq!(polls, 2);
    assert_eq!(info.state, JobState::Failed);
    assert_eq!(info.number_records_failed, 3);
    assert!(info.external_id_field_name.is_none());

    let results = conn.fetch_failure_details(&cancel, &info).await.unwrap();
    assert_eq!(results.state, JobState::Failed);
    assert!(results.job_info.is_some());

    let failures = results.failure_details.expect("failure details");
    assert_eq!(failures.failure_type, "Partial");
    assert_eq!(failures.failed_creates.len(), 1);
    assert_eq!(
        failures.failed_creates["MALFORMED_ID:malformed id:--"],
        vec![String::new(), String::new()]
    );
    assert_eq!(failures.failed_updates.len(), 1);
    assert_eq!(
        failures.failed_updates["ENTITY_IS_DELETED:entity is deleted:--"],
        vec!["001xx0000000003".to_string()]
    );
    assert_eq!(failures.total_failures(), info.number_records_failed as usize);
}

#[tokio::test]
async fn test_upsert_job_results_with_external_ids() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{INGEST}/750yy")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "750yy",
            "object": "Contact",
            "operation": "upsert",
            "externalIdFieldName": "Legacy_Id__c",
            "state": "JobComplete",
            "numberRecordsProcessed": 5,
            "numberRecordsFailed": 2
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{INGEST}/750yy/failedResults")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "sf__Error,LastName,sf__Id,legacy_id__c\n\
             REQUIRED_FIELD_MISSING:Required fields are missing: [LastName]:LastName --,,,L-1\n\
             INVALID_EMAIL_ADDRESS:Email: invalid email address:Email --,Doe,003xx0000000001,L-2\n",
            "text/csv; charset=UTF-8",
        ))
        .mount(&server)
        .await;

    let conn = connector(&server, ClientConfig::default());
    let results = conn
        .get_job_results(&CancellationToken::new(), "750yy")
        .await
        .unwrap();

    assert_eq!(results.state, JobState::JobComplete);
    assert_eq!(
        results.message,
        "Some records are not processed successfully. Please refer to the 'failureDetails' for more details."
    );
    let failures = results.failure_details.unwrap();
    assert_eq!(
        failures.failed_creates
            ["REQUIRED_FIELD_MISSING:Required fields are missing: [LastName]:LastName --"],
        vec!["L-1".to_string()]
    );
    assert_eq!(
        failures.failed_updates["INVALID_EMAIL_ADDRESS:Email: invalid email address:Email --"],
        vec!["L-2".to_string()]
    );
}

#[tokio::test]
async fn test_rejected_job_is_never_uploaded() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(INGEST))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": "750xx", "state": "Failed"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let conn = connector(&server, ClientConfig::default());
    let params = BulkOperationParams::new(
        "Account",
        BulkOperationMode::Delete,
        std::io::Cursor::new(delete_csv(3).into_bytes()),
    );
    let err = conn
        .bulk_delete(&CancellationToken::new(), params)
        .await
        .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::InvalidJobState(_)));
    assert_eq!(err.phase, Some(BulkPhase::CreateJob));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_html_response_is_unexpected_content_type() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{INGEST}/750ok")))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html><body>Login</body></html>", "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{INGEST}/750gw")))
        .respond_with(
            ResponseTemplate::new(502).set_body_raw("<html><body>Bad Gateway</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let conn = connector(&server, ClientConfig::default());
    let cancel = CancellationToken::new();

    for job_id in ["750ok", "750gw"] {
        let err = conn.get_job_info(&cancel, job_id).await.unwrap_err();
        assert_eq!(err.phase, Some(BulkPhase::GetJobInfo));
        assert!(
            matches!(
                err.client_error().map(|e| &e.kind),
                Some(ClientErrorKind::UnexpectedContentType { .. })
            ),
            "{job_id}: {err}"
        );
    }
}

#[tokio::test]
async fn test_gateway_html_page_stays_retryable() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{INGEST}/750xx")))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_raw("<html><body>Service Unavailable</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let conn = connector(&server, ClientConfig::default());
    let err = conn
        .get_job_info(&CancellationToken::new(), "750xx")
        .await
        .unwrap_err();

    let client_err = err.client_error().expect("client error");
    assert!(matches!(
        client_err.kind,
        ClientErrorKind::UnexpectedContentType { .. }
    ));
    assert_eq!(client_err.status(), Some(503));
    assert!(err.is_retryable());
    assert_eq!(err.phase, Some(BulkPhase::GetJobInfo));
}

#[tokio::test]
async fn test_cancel_while_polling() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{INGEST}/750xx")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "id": "750xx",
                    "object": "Account",
                    "operation": "delete",
                    "state": "InProgress"
                }))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let conn = connector(&server, ClientConfig::default());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = conn.get_job_info(&cancel, "750xx").await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.phase, Some(BulkPhase::GetJobInfo));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_timeout_is_retryable() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{INGEST}/750xx")))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .with_timeout(Duration::from_millis(200))
        .build();
    let conn = connector(&server, config);
    let err = conn
        .get_job_info(&CancellationToken::new(), "750xx")
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert!(!err.is_cancelled());
}
