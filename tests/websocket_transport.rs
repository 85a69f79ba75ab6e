use chatwire::error::Error;
use chatwire::{ChatMessage, Session, SessionState};
use futures_util::{SinkExt, Stream, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::{accept_async, tungstenite::Message as WsMessage};

async fn next_json<S>(ws: &mut S) -> Value
where
    S: Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match ws.next().await {
            Some(Ok(WsMessage::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("Expected text frame, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_session_over_websocket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        assert_eq!(
            next_json(&mut ws).await,
            json!({"username": "alice", "password": "pw"})
        );

        let auth = json!({
            "type": "AUTH_SUCCESS",
            "chats": [{"src": "carol", "dst": null, "msg": "welcome"}]
        });
        ws.send(WsMessage::Text(auth.to_string())).await.unwrap();

        assert_eq!(
            next_json(&mut ws).await,
            json!({"type": "CHAT", "src": "alice", "dst": "bob", "msg": "ping"})
        );

        let ignored = json!({"type": "PING"});
        ws.send(WsMessage::Text(ignored.to_string())).await.unwrap();
        let pong = json!({"type": "CHAT", "src": "bob", "dst": "alice", "msg": "pong"});
        ws.send(WsMessage::Text(pong.to_string())).await.unwrap();

        ws.close(None).await.unwrap();
    });

    let session = Session::start("alice", "pw", &format!("ws://{addr}"))
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.chats(), &[ChatMessage::group("carol", "welcome")]);

    session.send_direct_message("ping", "bob");

    let mut received = Vec::new();
    let mut receive_loop = session.make_receive_loop(|chat| received.push(chat));
    let err = receive_loop.run().await.unwrap_err();
    drop(receive_loop);

    assert!(err.is_transport(), "unexpected error: {err}");
    assert_eq!(received, vec![ChatMessage::direct("bob", "alice", "pong")]);

    server.await.unwrap();
}

#[tokio::test]
async fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = Session::start("alice", "pw", &format!("ws://{addr}"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Connection(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn test_invalid_credentials_over_websocket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        next_json(&mut ws).await;
        let reply = json!({"type": "INVALID_CREDENTIALS"});
        ws.send(WsMessage::Text(reply.to_string())).await.unwrap();
    });

    let err = Session::start("alice", "wrong", &format!("ws://{addr}"))
        .await
        .unwrap_err();
    assert_eq!(err, Error::InvalidCredentials);

    server.await.unwrap();
}

#[tokio::test]
async fn test_binary_frames_over_websocket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        next_json(&mut ws).await;

        let auth = json!({"type": "AUTH_SUCCESS", "chats": []});
        ws.send(WsMessage::Binary(auth.to_string().into_bytes()))
            .await
            .unwrap();
        let chat = json!({"type": "CHAT", "src": "bob", "dst": null, "msg": "bin"});
        ws.send(WsMessage::Binary(chat.to_string().into_bytes()))
            .await
            .unwrap();
        ws.send(WsMessage::Binary(vec![0xff, 0xfe])).await.unwrap();

        // Hold the connection open until the client goes away
        while let Some(Ok(_)) = ws.next().await {}
    });

    let session = Session::start("alice", "pw", &format!("ws://{addr}"))
        .await
        .unwrap();
    assert!(session.chats().is_empty());

    let mut received = Vec::new();
    let mut receive_loop = session.make_receive_loop(|chat| received.push(chat));
    let err = receive_loop.run().await.unwrap_err();
    drop(receive_loop);

    assert_eq!(err, Error::IncorrectFormat);
    assert_eq!(received, vec![ChatMessage::group("bob", "bin")]);

    session.close().await.unwrap();
    server.await.unwrap();
}
