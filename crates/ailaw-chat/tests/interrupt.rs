// Interrupting a streamed answer, then asking again on the same socket.

use std::sync::Arc;
use std::time::Duration;

use ailaw_api::ApiClient;
use ailaw_chat::{ChatSession, SendOutcome};
use ailaw_core::config::{ServerConfig, StreamConfig};
use ailaw_core::types::{MessageId, ModelType, Role, SessionId};
use ailaw_core::TokenStore;
use ailaw_stream::{StreamClient, StreamEvent};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

async fn next_event(events: &mut UnboundedReceiver<StreamEvent>) -> StreamEvent {
    timeout(WAIT, events.recv()).await.unwrap().unwrap()
}

async fn expect_chat_frame(ws: &mut WebSocketStream<TcpStream>) -> serde_json::Value {
    loop {
        match timeout(WAIT, ws.next()).await.unwrap() {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

async fn push(ws: &mut WebSocketStream<TcpStream>, frame: serde_json::Value) {
    ws.send(Message::Text(frame.to_string())).await.unwrap();
}

#[tokio::test]
async fn interrupted_answer_does_not_finish_the_next_one() {
    let http = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages-history/s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "00000", "message": "SUCCESS", "data": []
        })))
        .mount(&http)
        .await;
    let cfg = ServerConfig {
        api_url: http.uri(),
        ..Default::default()
    };
    let tokens = TokenStore::new(Some("t1".into()));
    let api = Arc::new(ApiClient::new(&cfg, tokens.clone(), None).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("ws://{}", listener.local_addr().unwrap());
    let (stream, mut events) = StreamClient::spawn(&StreamConfig::default(), &base, tokens).unwrap();
    let (tcp, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    let mut server = tokio_tungstenite::accept_async(tcp).await.unwrap();
    assert_eq!(next_event(&mut events).await, StreamEvent::Connected);

    let mut chat = ChatSession::new(api, Some(stream), ModelType::Normal);
    chat.load_history(SessionId::from("s-1")).await.unwrap();

    assert_eq!(chat.send("first question").await.unwrap(), SendOutcome::Streaming);
    assert_eq!(expect_chat_frame(&mut server).await["content"], "first question");
    push(&mut server, json!({ "type": "chunk", "sessionId": "s-1", "content": "old " })).await;
    let event = next_event(&mut events).await;
    chat.handle(&event);
    assert_eq!(chat.interrupt().as_deref(), Some("old "));
    assert!(!chat.is_sending());

    assert_eq!(chat.send("second question").await.unwrap(), SendOutcome::Streaming);
    assert_eq!(expect_chat_frame(&mut server).await["content"], "second question");

    // the server finishes the first answer before starting the second
    push(&mut server, json!({ "type": "chunk", "sessionId": "s-1", "content": "tail" })).await;
    push(&mut server, json!({ "type": "done", "sessionId": "s-1", "modelMessageId": "m-old" })).await;
    push(&mut server, json!({ "type": "chunk", "sessionId": "s-1", "content": "new answer" })).await;
    push(&mut server, json!({ "type": "done", "sessionId": "s-1", "modelMessageId": "m-new" })).await;

    for _ in 0..2 {
        let event = next_event(&mut events).await;
        assert!(!chat.conversation().is_current(&event));
        chat.handle(&event);
    }
    assert!(chat.is_sending());

    for _ in 0..2 {
        let event = next_event(&mut events).await;
        chat.handle(&event);
    }
    assert!(!chat.is_sending());

    let messages = chat.conversation().messages();
    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::User, Role::Model]);
    assert_eq!(messages[1].content, "second question");
    assert_eq!(messages[2].message_id, MessageId::from("m-new"));
    assert_eq!(messages[2].content, "new answer");
}
