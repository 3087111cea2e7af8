use std::sync::Arc;

use ailaw_api::ApiClient;
use ailaw_chat::{ChatError, ChatSession, SendOutcome};
use ailaw_core::config::{ServerConfig, StreamConfig};
use ailaw_core::types::{Feedback, MessageId, ModelType, Role, SessionId};
use ailaw_core::{AilawError, TokenStore};
use ailaw_stream::{StreamClient, StreamEvent};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": "00000",
        "message": "SUCCESS",
        "data": data,
    }))
}

fn api(server: &MockServer) -> Arc<ApiClient> {
    let cfg = ServerConfig {
        api_url: server.uri(),
        ..Default::default()
    };
    Arc::new(ApiClient::new(&cfg, TokenStore::new(Some("t1".into())), None).unwrap())
}

#[tokio::test]
async fn first_prompt_creates_session_and_falls_back_to_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/session"))
        .and(body_json(json!({ "title": "Can I break my lease early?" })))
        .respond_with(ok(json!("s-1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/model"))
        .respond_with(ok(json!({ "message": "Usually, with notice.", "modelMessageID": "m-1" })))
        .expect(1)
        .mount(&server)
        .await;

    // a stream that never connects: no token in its store
    let (stream, _events) =
        StreamClient::spawn(&StreamConfig::default(), "ws://127.0.0.1:9", TokenStore::default()).unwrap();

    let mut chat = ChatSession::new(api(&server), Some(stream), ModelType::Normal);
    let outcome = chat.send("Can I break my lease early?").await.unwrap();
    assert_eq!(outcome, SendOutcome::Answered(MessageId::from("m-1")));
    assert!(!chat.is_sending());

    let conv = chat.conversation();
    assert_eq!(conv.session_id(), Some(&SessionId::from("s-1")));
    assert_eq!(conv.title(), "Can I break my lease early?");
    assert_eq!(conv.messages().len(), 2);
    assert_eq!(conv.messages()[0].role, Role::User);
    assert_eq!(conv.messages()[1].content, "Usually, with notice.");
}

#[tokio::test]
async fn empty_http_reply_shows_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages-history/s-1"))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/model"))
        .respond_with(ok(json!({ "message": "" })))
        .mount(&server)
        .await;

    let mut chat = ChatSession::new(api(&server), None, ModelType::Cot);
    chat.load_history(SessionId::from("s-1")).await.unwrap();
    chat.send("hello").await.unwrap();
    assert_eq!(chat.conversation().messages()[1].content, "No response");
}

#[tokio::test]
async fn failed_http_send_reverts_and_returns_input() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages-history/s-1"))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/model"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "code": "10002", "message": "quota exceeded"
        })))
        .mount(&server)
        .await;

    let mut chat = ChatSession::new(api(&server), None, ModelType::Normal);
    chat.load_history(SessionId::from("s-1")).await.unwrap();

    let err = chat.send("  my question  ").await.unwrap_err();
    assert!(matches!(
        err.api_error(),
        Some(AilawError::Api { code, .. }) if code == "10002"
    ));
    assert_eq!(err.into_input().as_deref(), Some("my question"));
    assert!(chat.conversation().messages().is_empty());
    assert!(chat.conversation().pending().is_none());
}

#[tokio::test]
async fn blank_prompt_is_rejected_without_requests() {
    let server = MockServer::start().await;
    let mut chat = ChatSession::new(api(&server), None, ModelType::Normal);
    assert!(matches!(chat.send("   ").await, Err(ChatError::EmptyInput)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn stream_events_finish_the_answer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages-history/s-1"))
        .respond_with(ok(json!([
            { "messageId": "u-0", "role": "user", "content": "earlier", "createdAt": "2025-01-01T00:00:00Z" }
        ])))
        .mount(&server)
        .await;

    let mut chat = ChatSession::new(api(&server), None, ModelType::Normal);
    chat.load_history(SessionId::from("s-1")).await.unwrap();
    assert_eq!(chat.conversation().title(), "earlier");

    chat.handle(&StreamEvent::Chunk {
        session_id: SessionId::from("s-1"),
        content: "streamed".into(),
    });
    assert_eq!(chat.conversation().streaming_text(), Some("streamed"));
    let shown = chat.handle(&StreamEvent::Done {
        session_id: Some(SessionId::from("s-1")),
        model_message_id: Some(MessageId::from("m-2")),
        content: None,
    });
    assert!(shown.is_none());
    assert_eq!(chat.conversation().messages().len(), 2);
    assert!(!chat.is_sending());
}

#[tokio::test]
async fn like_reverts_when_server_refuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages-history/s-1"))
        .respond_with(ok(json!([
            { "messageId": "u-1", "role": "user", "content": "q", "createdAt": "2025-01-01T00:00:00Z" },
            { "messageId": "m-1", "role": "model", "content": "a", "createdAt": "2025-01-01T00:00:01Z", "feedback": -1 }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/feedback/m-1"))
        .and(body_json(json!({ "feedback": 1 })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": "99999", "message": "internal server error"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/feedback/m-1"))
        .and(body_json(json!({ "feedback": null })))
        .respond_with(ok(json!(null)))
        .mount(&server)
        .await;

    let mut chat = ChatSession::new(api(&server), None, ModelType::Normal);
    chat.load_history(SessionId::from("s-1")).await.unwrap();
    let id = MessageId::from("m-1");

    assert!(chat.like(&id).await.is_err());
    assert_eq!(chat.conversation().feedback_of(&id), Some(Feedback::Dislike));

    // same kind again clears it
    assert_eq!(chat.dislike(&id).await.unwrap(), None);
    assert_eq!(chat.conversation().feedback_of(&id), None);
}
