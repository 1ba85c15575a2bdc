//! 401 recovery: refresh once, replay once, tear the session down when refresh fails.

mod common;

use std::sync::{Arc, Mutex};

use common::{builder_for, RecordingNavigator, TestSessionProvider};
use enterprise_api_client::auth::SESSION_EXPIRED_MESSAGE;
use enterprise_api_client::sdk::CreateEnterpriseDto;
use enterprise_api_client::{ApiResult, AuthEvent, ErrorCode, RequestOptions};
use serde_json::Value;

const CREATED: &str = r#"{
    "data": {
        "id": "ent_1",
        "name": "Acme",
        "country_code": "UA",
        "default_currency": "UAH",
        "status": "active",
        "owner_user_id": "usr_1",
        "created_at": "2024-01-01T00:00:00Z"
    }
}"#;

#[tokio::test]
async fn expired_token_is_refreshed_and_request_replayed() {
    let mut server = mockito::Server::new_async().await;
    let stale = server
        .mock("POST", "/api/enterprises")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"jwt expired"}"#)
        .expect(1)
        .create_async()
        .await;
    let fresh = server
        .mock("POST", "/api/enterprises")
        .match_header("authorization", "Bearer fresh")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(CREATED)
        .expect(1)
        .create_async()
        .await;

    let provider = TestSessionProvider::new("stale", Some("fresh"));
    let client = builder_for(&server)
        .session_provider(provider.clone())
        .build()
        .unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    client
        .auth()
        .events()
        .subscribe(move |e| sink.lock().unwrap().push(*e));

    let dto = CreateEnterpriseDto {
        name: "Acme".into(),
        country_code: "UA".into(),
        default_currency: "UAH".into(),
        default_locale: None,
    };
    let result = client.enterprises().create(&dto).await.unwrap();

    stale.assert_async().await;
    fresh.assert_async().await;
    assert_eq!(result.status(), 201);
    let envelope = result.data().unwrap();
    assert_eq!(envelope.data.id, "ent_1");
    assert_eq!(provider.refresh_calls(), 1);
    assert_eq!(provider.sign_outs(), 0);
    assert_eq!(*events.lock().unwrap(), vec![AuthEvent::TokenRefreshed]);
}

#[tokio::test]
async fn second_unauthorized_is_final() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/enterprises")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Unauthorized"}"#)
        .expect(2)
        .create_async()
        .await;

    let provider = TestSessionProvider::new("stale", Some("fresh"));
    let navigator = RecordingNavigator::at("/dashboard");
    let client = builder_for(&server)
        .session_provider(provider.clone())
        .navigator(navigator.clone())
        .build()
        .unwrap();

    let result: ApiResult<Value> = client
        .get("/api/enterprises", RequestOptions::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.status(), 401);
    assert_eq!(result.error().unwrap().code, ErrorCode::Unauthorized);
    assert_eq!(provider.refresh_calls(), 1);
    assert!(navigator.redirects().is_empty());
}

#[tokio::test]
async fn failed_refresh_tears_down_and_redirects() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/enterprises")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let provider = TestSessionProvider::new("stale", None);
    let navigator = RecordingNavigator::at("/dashboard?tab=1");
    let client = builder_for(&server)
        .session_provider(provider.clone())
        .navigator(navigator.clone())
        .build()
        .unwrap();

    let result: ApiResult<Value> = client
        .get("/api/enterprises", RequestOptions::new())
        .await
        .unwrap();

    mock.assert_async().await;
    let error = result.error().unwrap();
    assert_eq!(error.code, ErrorCode::Unauthorized);
    assert_eq!(error.status_code, 401);
    assert_eq!(error.message, SESSION_EXPIRED_MESSAGE);
    assert_eq!(provider.refresh_calls(), 1);
    assert_eq!(provider.sign_outs(), 1);
    assert_eq!(
        navigator.redirects(),
        vec!["/login?redirect=%2Fdashboard%3Ftab%3D1".to_string()]
    );
}

#[tokio::test]
async fn public_requests_never_refresh() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/locales")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let provider = TestSessionProvider::new("stale", Some("fresh"));
    let client = builder_for(&server)
        .session_provider(provider.clone())
        .build()
        .unwrap();

    let result: ApiResult<Value> = client
        .get("/api/locales", RequestOptions::new().public())
        .await
        .unwrap();

    assert_eq!(result.status(), 401);
    assert_eq!(provider.refresh_calls(), 0);
    assert_eq!(provider.sign_outs(), 0);
}

#[tokio::test]
async fn signed_out_session_has_no_token() {
    let provider = TestSessionProvider::new("stale", None);
    let client = enterprise_api_client::ApiClient::builder()
        .session_provider(provider.clone())
        .build()
        .unwrap();

    assert!(client.auth().is_authenticated().await);
    client.auth().teardown().await;
    assert!(!client.auth().is_authenticated().await);
    assert_eq!(client.auth().get_token().await, None);
}
