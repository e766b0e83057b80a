// Integration tests for the realtime room layer, driven against an
// in-process websocket server speaking the channel protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use stratus_api::{ApiConfig, Client, ConnectionEvent, Error};
use stratus_model::EventPayload;

const WAIT: Duration = Duration::from_secs(5);

// ── Test server ─────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum ServerBehavior {
    /// Acknowledge every handshake and push with `ok`.
    AcceptAll,
    /// Reject join handshakes with an `error` reply.
    RejectJoin,
    /// Acknowledge the join, then close the connection.
    CloseAfterJoin,
    /// On `watch`: push one undecodable and one good event, then ack.
    PushEventsOnWatch,
}

/// Spawn a channel-protocol server; returns its base URL (to be used as
/// the data-plane URL) and a counter of join handshakes observed.
async fn spawn_room_server(behavior: ServerBehavior) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let join_count = Arc::new(AtomicUsize::new(0));
    let joins = Arc::clone(&join_count);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let joins = Arc::clone(&joins);
            tokio::spawn(async move {
                let mut ws = match tokio_tungstenite::accept_async(stream).await {
                    Ok(ws) => ws,
                    Err(_) => return,
                };

                while let Some(Ok(message)) = ws.next().await {
                    let Message::Text(text) = message else { continue };
                    let frame: Value = match serde_json::from_str(text.as_str()) {
                        Ok(frame) => frame,
                        Err(_) => continue,
                    };

                    let reply = |status: &str| {
                        json!({
                            "topic": frame["topic"],
                            "event": "phx_reply",
                            "payload": { "status": status, "response": {} },
                            "ref": frame["ref"]
                        })
                        .to_string()
                    };

                    match frame["event"].as_str().unwrap_or("") {
                        "phx_join" => {
                            joins.fetch_add(1, Ordering::SeqCst);
                            let status = match behavior {
                                ServerBehavior::RejectJoin => "error",
                                _ => "ok",
                            };
                            if ws.send(Message::Text(reply(status).into())).await.is_err() {
                                return;
                            }
                            if matches!(behavior, ServerBehavior::CloseAfterJoin) {
                                let _ = ws.send(Message::Close(None)).await;
                                return;
                            }
                        }
                        "watch" => {
                            if matches!(behavior, ServerBehavior::PushEventsOnWatch) {
                                let bad = json!({
                                    "topic": frame["topic"],
                                    "event": "new_event",
                                    "payload": { "event": { "type": "bogus" } }
                                });
                                let good = json!({
                                    "topic": frame["topic"],
                                    "event": "new_event",
                                    "payload": {
                                        "device_id": "dev-1",
                                        "event": {
                                            "type": "device_connected",
                                            "device_ip_address": "10.0.0.9"
                                        }
                                    }
                                });
                                for event in [bad, good] {
                                    if ws.send(Message::Text(event.to_string().into())).await.is_err() {
                                        return;
                                    }
                                }
                            }
                            if ws.send(Message::Text(reply("ok").into())).await.is_err() {
                                return;
                            }
                        }
                        "phx_leave" => {
                            if ws.send(Message::Text(reply("ok").into())).await.is_err() {
                                return;
                            }
                        }
                        _ => {}
                    }
                }
            });
        }
    });

    (format!("http://{addr}"), join_count)
}

fn client_for(data_url: &str) -> Client {
    let config = ApiConfig {
        realm: "acme".to_owned(),
        token: SecretString::from("test-token".to_owned()),
        data_api_url: data_url.to_owned(),
        ..ApiConfig::default()
    };
    Client::with_http(&config, reqwest::Client::new())
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_joins_share_one_handshake_and_one_handle() {
    let (url, join_count) = spawn_room_server(ServerBehavior::AcceptAll).await;
    let client = client_for(&url);

    let (first, second) = tokio::join!(client.join_room("kitchen"), client.join_room("kitchen"));
    let first = first.expect("first join");
    let second = second.expect("second join");

    assert!(first.same_channel(&second));
    assert_eq!(join_count.load(Ordering::SeqCst), 1);

    // A later join is still idempotent.
    let third = client.join_room("kitchen").await.expect("third join");
    assert!(third.same_channel(&first));
    assert_eq!(join_count.load(Ordering::SeqCst), 1);

    assert_eq!(first.topic(), "rooms:acme:kitchen");
}

#[tokio::test]
async fn distinct_rooms_share_the_socket_but_not_the_channel() {
    let (url, join_count) = spawn_room_server(ServerBehavior::AcceptAll).await;
    let client = client_for(&url);

    let kitchen = client.join_room("kitchen").await.expect("join kitchen");
    let porch = client.join_room("porch").await.expect("join porch");

    assert!(!kitchen.same_channel(&porch));
    assert_eq!(join_count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rejected_join_is_not_cached() {
    let (url, join_count) = spawn_room_server(ServerBehavior::RejectJoin).await;
    let client = client_for(&url);

    let err = client.join_room("kitchen").await.unwrap_err();
    assert!(matches!(err, Error::ChannelReply { .. }), "got: {err:?}");

    // Not cached: the next join attempts a fresh handshake.
    let err = client.join_room("kitchen").await.unwrap_err();
    assert!(matches!(err, Error::ChannelReply { .. }), "got: {err:?}");
    assert_eq!(join_count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn events_reach_the_handler_and_bad_payloads_are_rejected() {
    let (url, _) = spawn_room_server(ServerBehavior::PushEventsOnWatch).await;
    let client = client_for(&url);

    let handle = client.join_room("kitchen").await.expect("join");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    client
        .listen("kitchen", move |event| {
            let _ = event_tx.send(event);
        })
        .await
        .expect("listen");

    client
        .register_volatile_trigger("kitchen", json!({ "on": "device_connected" }))
        .await
        .expect("watch acknowledged");

    let event = timeout(WAIT, event_rx.recv())
        .await
        .expect("event before timeout")
        .expect("handler delivered an event");

    assert_eq!(event.device_id, "dev-1");
    assert!(matches!(event.event, EventPayload::DeviceConnected { .. }));

    // The undecodable payload was rejected in the channel layer, counted,
    // and never handed to the handler.
    assert_eq!(handle.decode_failures(), 1);
    assert!(event_rx.try_recv().is_err());
}

#[tokio::test]
async fn leave_removes_the_room_and_listen_needs_a_fresh_join() {
    let (url, join_count) = spawn_room_server(ServerBehavior::AcceptAll).await;
    let client = client_for(&url);

    client.join_room("kitchen").await.expect("join");
    client.leave_room("kitchen").await.expect("leave");

    let err = client.listen("kitchen", |_| {}).await.unwrap_err();
    assert!(matches!(err, Error::RoomNotJoined { .. }), "got: {err:?}");

    // Joining again performs a new handshake.
    client.join_room("kitchen").await.expect("rejoin");
    assert_eq!(join_count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn room_operations_without_a_join_are_precondition_errors() {
    // No server: nothing may be contacted for these to fail.
    let client = client_for("http://127.0.0.1:9");

    let err = client.listen("kitchen", |_| {}).await.unwrap_err();
    assert!(matches!(err, Error::RoomNotJoined { .. }), "got: {err:?}");

    let err = client
        .register_volatile_trigger("kitchen", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RoomNotJoined { .. }), "got: {err:?}");

    let err = client.leave_room("kitchen").await.unwrap_err();
    assert!(matches!(err, Error::RoomNotJoined { .. }), "got: {err:?}");
}

#[tokio::test]
async fn socket_close_broadcasts_to_listeners() {
    let (url, _) = spawn_room_server(ServerBehavior::CloseAfterJoin).await;
    let client = client_for(&url);

    let (close_tx, mut close_rx) = mpsc::unbounded_channel();
    client.add_listener(
        ConnectionEvent::SocketClose,
        Arc::new(move |notice| {
            let _ = close_tx.send(notice.detail.clone());
        }),
    );

    client.join_room("kitchen").await.expect("join");

    let detail = timeout(WAIT, close_rx.recv())
        .await
        .expect("close notice before timeout")
        .expect("listener fired");
    assert!(detail.contains("closed"), "detail: {detail}");

    // The dead socket rejects further pushes instead of hanging.
    let result = client
        .register_volatile_trigger("kitchen", json!({}))
        .await;
    assert!(result.is_err());
}
