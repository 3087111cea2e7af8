use std::sync::Arc;

use ailaw_api::ApiClient;
use ailaw_core::config::ServerConfig;
use ailaw_core::types::{Feedback, MessageId, ModelType, SessionId};
use ailaw_core::{AilawError, TokenStore};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": "00000",
        "message": "SUCCESS",
        "data": data,
    }))
}

fn action(action: &str) -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({
        "code": "10003",
        "message": "unauthorized access",
        "data": { "action": action },
    }))
}

fn client(server: &MockServer, token: Option<&str>, refresh: Option<&str>) -> ApiClient {
    let cfg = ServerConfig {
        api_url: server.uri(),
        ..Default::default()
    };
    ApiClient::new(&cfg, TokenStore::new(token.map(String::from)), refresh).unwrap()
}

#[tokio::test]
async fn create_session_sends_bearer_and_title() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/session"))
        .and(header("authorization", "Bearer t1"))
        .and(body_json(json!({ "title": "Is a verbal lease binding?" })))
        .respond_with(ok(json!("s-1")))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, Some("t1"), None);
    let id = api.create_session("Is a verbal lease binding?").await.unwrap();
    assert_eq!(id, SessionId::from("s-1"));
}

#[tokio::test]
async fn missing_token_fails_without_request() {
    let server = MockServer::start().await;
    let api = client(&server, None, None);
    let err = api.list_sessions().await.unwrap_err();
    assert!(matches!(err, AilawError::MissingToken));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn refresh_action_refreshes_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions-history"))
        .and(header("authorization", "Bearer old"))
        .respond_with(action("refresh"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("cookie", "refresh_token=r1"))
        .respond_with(ok(json!({ "accessToken": "new" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions-history"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ok(json!([
            { "sessionId": "s-1", "title": "Lease", "createdAt": "2025-01-01T00:00:00Z", "lastMessageAt": "2025-01-02T00:00:00Z" }
        ])))
        .mount(&server)
        .await;

    let api = client(&server, Some("old"), Some("r1"));
    let sessions = api.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].title, "Lease");
    assert_eq!(api.tokens().get().as_deref(), Some("new"));
}

#[tokio::test]
async fn concurrent_refresh_happens_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions-history"))
        .and(header("authorization", "Bearer old"))
        .respond_with(action("refresh"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ok(json!({ "accessToken": "new" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions-history"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;

    let api = Arc::new(client(&server, Some("old"), None));
    let (a, b) = tokio::join!(api.list_sessions(), api.list_sessions());
    assert!(a.unwrap().is_empty());
    assert!(b.unwrap().is_empty());
}

#[tokio::test]
async fn failed_refresh_logs_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages-history/s-1"))
        .respond_with(action("refresh"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "10003", "message": "unauthorized access"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, Some("old"), None);
    let err = api.messages(&SessionId::from("s-1")).await.unwrap_err();
    assert!(matches!(err, AilawError::RefreshFailed));
    assert!(!api.tokens().is_present());
}

#[tokio::test]
async fn logout_action_clears_token() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/session/s-1"))
        .respond_with(action("logout"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ok(json!(null)))
        .mount(&server)
        .await;

    let api = client(&server, Some("t1"), None);
    let err = api.delete_session(&SessionId::from("s-1")).await.unwrap_err();
    assert!(matches!(err, AilawError::LoggedOut));
    assert!(!api.tokens().is_present());
}

#[tokio::test]
async fn error_envelope_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/model"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "10001", "message": "user prompt length exceeded"
        })))
        .mount(&server)
        .await;

    let api = client(&server, Some("t1"), None);
    let err = api
        .ask_model(&SessionId::from("s-1"), ModelType::Normal, "very long")
        .await
        .unwrap_err();
    match err {
        AilawError::Api { code, message } => {
            assert_eq!(code, "10001");
            assert_eq!(message, "user prompt length exceeded");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn ask_model_posts_single_user_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/model"))
        .and(body_json(json!({
            "sessionId": "s-1",
            "modelType": "COT",
            "input": { "messages": { "role": "user", "content": "hi" } }
        })))
        .respond_with(ok(json!({ "message": "hello", "modelMessageID": "m-1" })))
        .mount(&server)
        .await;

    let api = client(&server, Some("t1"), None);
    let reply = api
        .ask_model(&SessionId::from("s-1"), ModelType::Cot, "hi")
        .await
        .unwrap();
    assert_eq!(reply.message, "hello");
    assert_eq!(reply.model_message_id.as_deref(), Some("m-1"));
}

#[tokio::test]
async fn rename_trims_and_rejects_blank() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/name/session/s-1"))
        .and(body_json(json!({ "newName": "Tenancy" })))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, Some("t1"), None);
    let id = SessionId::from("s-1");
    assert_eq!(api.rename_session(&id, "  Tenancy ").await.unwrap(), "Tenancy");
    assert!(matches!(
        api.rename_session(&id, "   ").await,
        Err(AilawError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn feedback_and_history() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/feedback/m-1"))
        .and(body_json(json!({ "feedback": -1 })))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/messages-history/s-1"))
        .respond_with(ok(json!([
            { "sessionId": "s-1", "messageId": "u-1", "role": "user", "content": "q", "createdAt": "2025-01-01T00:00:00Z", "feedback": null },
            { "sessionId": "s-1", "messageId": "m-1", "role": "model", "content": "a", "createdAt": "2025-01-01T00:00:01Z", "feedback": "1" }
        ])))
        .mount(&server)
        .await;

    let api = client(&server, Some("t1"), None);
    api.set_feedback(&MessageId::from("m-1"), Some(Feedback::Dislike))
        .await
        .unwrap();
    let history = api.messages(&SessionId::from("s-1")).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].feedback, Some(Feedback::Like));
}

#[tokio::test]
async fn exchange_code_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/google/callback"))
        .and(query_param("code", "abc/123"))
        .respond_with(
            ok(json!({ "accessToken": "jwt" }))
                .insert_header("set-cookie", "refresh_token=r9; Path=/auth; HttpOnly"),
        )
        .mount(&server)
        .await;

    let api = client(&server, None, None);
    assert_eq!(api.refresh_token(), None);
    assert_eq!(api.exchange_code("abc/123").await.unwrap(), "jwt");
    assert_eq!(api.tokens().get().as_deref(), Some("jwt"));
    // the callback's cookie is readable so the CLI can hand it back
    assert_eq!(api.refresh_token().as_deref(), Some("r9"));

    let url = api.google_login_url(Some("a@b.com")).unwrap();
    assert!(url.ends_with("/auth/google/login?email=a%40b.com"));
}

#[test]
fn configured_refresh_token_seeds_the_jar() {
    let cfg = ServerConfig {
        api_url: "http://127.0.0.1:9".into(),
        ..Default::default()
    };
    let api = ApiClient::new(&cfg, TokenStore::default(), Some(" r1 ")).unwrap();
    assert_eq!(api.refresh_token().as_deref(), Some("r1"));
}

#[tokio::test]
async fn health_is_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let api = client(&server, None, None);
    api.health().await.unwrap();
}
