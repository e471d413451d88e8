use mockito::Matcher;
use serde_json::json;

use scanpage_common::{
    ApiClient, ApiConfig, CandidatePayload, Error, GroupPayload, Method, TaxonomyPayload,
};

fn client_for(server: &mockito::ServerGuard) -> ApiClient {
    ApiClient::new(ApiConfig {
        server_url: server.url(),
        ..Default::default()
    })
    .expect("client builds")
}

#[tokio::test]
async fn post_sends_json_body_and_token_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/candidates")
        .match_header("authorization", "token upload-token")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "id": "cand_0",
            "ra": 234.22,
            "filter_ids": [4],
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "success", "data": {"id": "cand_0"}}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let candidate = CandidatePayload::new("cand_0", 4);
    let (status, body) = client
        .api(Method::Post, "candidates", Some(&candidate), Some("upload-token"))
        .await
        .expect("request succeeds")
        .into_parts();

    assert_eq!(status, 200);
    assert_eq!(body["data"]["id"], json!("cand_0"));
    mock.assert_async().await;
}

#[tokio::test]
async fn non_success_status_is_returned_not_raised() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/groups")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "error", "message": "Duplicate group name"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .post("groups", &json!({ "name": "dup" }), "admin-token")
        .await
        .expect("transport succeeds");

    assert_eq!(response.status, 400);
    assert!(!response.is_success());
    assert_eq!(response.body["message"], json!("Duplicate group name"));
}

#[tokio::test]
async fn non_json_error_body_decodes_to_null() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/photometry")
        .with_status(500)
        .with_body("Internal Server Error")
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .post("photometry", &json!({}), "token")
        .await
        .expect("transport succeeds");

    assert_eq!(response.status, 500);
    assert!(response.body.is_null());
}

#[tokio::test]
async fn non_json_success_body_is_a_decode_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/annotation")
        .with_status(200)
        .with_body("<html>login</html>")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .post("annotation", &json!({}), "token")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { ref path, .. } if path == "annotation"));
}

#[tokio::test]
async fn post_group_returns_created_id() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/groups")
        .match_body(Matcher::Json(json!({ "name": "g1", "group_admins": [3] })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "success", "data": {"id": 42}}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let group = GroupPayload {
        name: "g1".to_string(),
        group_admins: vec![3],
    };
    let id = client.post_group(&group, "admin-token").await.expect("group created");
    assert_eq!(id, 42);
}

#[tokio::test]
async fn post_taxonomy_reads_taxonomy_id() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/taxonomy")
        .match_header("authorization", "token tax-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "success", "data": {"taxonomy_id": 9}}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let taxonomy = TaxonomyPayload::sample("test taxonomy", vec![1]);
    let id = client.post_taxonomy(&taxonomy, "tax-token").await.expect("taxonomy created");
    assert_eq!(id, 9);
}

#[tokio::test]
async fn typed_helper_fails_on_error_envelope() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/candidates")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "error", "message": "Invalid filter ID"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .post_candidate(&CandidatePayload::new("c", 999), "token")
        .await
        .unwrap_err();

    match err {
        Error::UnexpectedStatus { method, path, status, .. } => {
            assert_eq!(method, "POST");
            assert_eq!(path, "candidates");
            assert_eq!(status, 400);
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn configured_auth_scheme_is_used() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/sysinfo")
        .match_header("authorization", "Bearer abc")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "success", "data": {}}"#)
        .create_async()
        .await;

    let client = ApiClient::new(ApiConfig {
        server_url: server.url(),
        auth_scheme: "Bearer".to_string(),
        ..Default::default()
    })
    .expect("client builds");

    let response = client
        .api::<()>(Method::Get, "sysinfo", None, Some("abc"))
        .await
        .expect("request succeeds");
    assert!(response.is_success());
    mock.assert_async().await;
}

#[tokio::test]
async fn connection_failure_propagates() {
    let client = ApiClient::new(ApiConfig {
        server_url: "http://127.0.0.1:1".to_string(),
        ..Default::default()
    })
    .expect("client builds");

    let err = client
        .post("candidates", &json!({}), "token")
        .await
        .unwrap_err();

    assert!(err.is_transport(), "expected transport error, got {err:?}");
}
