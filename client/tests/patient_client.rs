#![allow(clippy::unwrap_used, clippy::expect_used)]

use contact_client::ClientConfig;
use contact_client::ClientError;
use contact_client::PatientClient;
use contact_navigator::PatientApi;
use contact_protocol::PatientStats;
use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;
use wiremock::matchers::query_param_is_missing;

const PATIENTS: &str = "/api/v1/patients";

fn patient_json(id: &str, contacted: bool) -> Value {
    json!({
        "id": id,
        "firstName": "Ada",
        "lastName": "Lovelace",
        "ssn": "120-44-9876",
        "gender": { "id": 2, "name": "Female" },
        "contacted": contacted,
        "created": "2024-03-01T09:00:00Z",
        "updated": "2024-03-02T09:00:00Z"
    })
}

async fn client_for(server: &MockServer) -> PatientClient {
    let config = ClientConfig {
        base_url: format!("{}{PATIENTS}/", server.uri()),
        request_timeout_secs: 5,
    };
    PatientClient::new(&config).expect("client")
}

#[tokio::test]
async fn fetch_patient_decodes_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PATIENTS}/p-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(patient_json("p-1", false)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let patient = client.fetch_patient("p-1").await.expect("fetch").expect("found");

    assert_eq!(patient.id, "p-1");
    assert_eq!(patient.full_name(), "Ada Lovelace");
    assert_eq!(patient.gender.map(|g| g.name), Some("Female".to_string()));
}

#[tokio::test]
async fn missing_patient_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PATIENTS}/gone")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": "NotFound", "message": "patient gone not found" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert_eq!(client.fetch_patient("gone").await.expect("fetch"), None);
}

#[tokio::test]
async fn ids_are_sent_as_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PATIENTS}/a%2Fb%3Fc%23d")))
        .respond_with(ResponseTemplate::new(200).set_body_json(patient_json("a/b?c#d", false)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{PATIENTS}/a%2Fb%3Fc%23d")))
        .and(body_json(json!({ "contacted": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "contacted": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let patient = client
        .fetch_patient("a/b?c#d")
        .await
        .expect("fetch")
        .expect("found");
    assert_eq!(patient.id, "a/b?c#d");

    let patch = client
        .update_contacted_patient("a/b?c#d", true)
        .await
        .expect("update");
    assert_eq!(patch.contacted, Some(true));
}

#[test]
fn rejects_a_base_url_that_cannot_hold_paths() {
    for base_url in ["not a url", "mailto:clinic@example.com"] {
        let config = ClientConfig {
            base_url: base_url.to_string(),
            request_timeout_secs: 5,
        };
        let err = PatientClient::new(&config).expect_err("invalid base URL");
        assert!(matches!(err, ClientError::InvalidBaseUrl(_)), "{base_url}");
    }
}

#[tokio::test]
async fn lists_are_filtered_by_contacted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PATIENTS))
        .and(query_param("contacted", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            patient_json("a", false),
            patient_json("b", false),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PATIENTS))
        .and(query_param("contacted", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([patient_json("c", true)])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let uncontacted = client.fetch_uncontacted_patients().await.expect("list");
    let contacted = client.fetch_contacted_patients().await.expect("list");

    let ids: Vec<_> = uncontacted.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(contacted.len(), 1);
    assert!(contacted[0].contacted);
}

#[tokio::test]
async fn stats_come_from_three_independent_counts() {
    let server = MockServer::start().await;
    let count_path = format!("{PATIENTS}/stats/count");
    Mock::given(method("GET"))
        .and(path(count_path.clone()))
        .and(query_param_is_missing("contacted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(10)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(count_path.clone()))
        .and(query_param("contacted", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(3)))
        .expect(1)
        .mount(&server)
        .await;
    // Deliberately inconsistent with the other two.
    Mock::given(method("GET"))
        .and(path(count_path))
        .and(query_param("contacted", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(8)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let stats = client.fetch_patient_stats().await.expect("stats");

    assert_eq!(
        stats,
        PatientStats {
            total_patients_count: 10,
            contacted_patients_count: 3,
            remaining_patients_count: 8,
        }
    );
}

#[tokio::test]
async fn update_sends_contacted_only_and_accepts_partial_reply() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{PATIENTS}/p-1")))
        .and(body_json(json!({ "contacted": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "contacted": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let patch = PatientApi::update_contacted_patient(&client, "p-1", true)
        .await
        .expect("update");

    assert_eq!(patch.contacted, Some(true));
    assert_eq!(patch.id, None);
    assert_eq!(patch.first_name, None);
}

#[tokio::test]
async fn error_status_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{PATIENTS}/p-1")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": "BadRequest", "message": "firstName must not be blank" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PATIENTS))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;

    let err = client
        .update_contacted_patient("p-1", false)
        .await
        .expect_err("400");
    assert_eq!(err.status(), Some(400));
    match err {
        ClientError::Status { message, .. } => assert_eq!(message, "firstName must not be blank"),
        other => panic!("unexpected error: {other:?}"),
    }

    let err = client.fetch_uncontacted_patients().await.expect_err("500");
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let config = ClientConfig {
        base_url: "http://127.0.0.1:9/api/v1/patients".to_string(),
        request_timeout_secs: 2,
    };
    let client = PatientClient::new(&config).expect("client");

    let err = client.fetch_patient("p-1").await.expect_err("connection refused");
    assert!(matches!(err, ClientError::Network(_)));
}
