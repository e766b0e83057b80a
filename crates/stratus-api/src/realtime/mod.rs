//! Realtime room subscription over one persistent socket.
//!
//! The socket is created lazily on the first room join and reused for the
//! client's lifetime. A background task owns the connection: it writes
//! pushes, routes `phx_reply` acknowledgments back to waiting callers by
//! ref, and dispatches decoded `new_event` payloads to per-room handlers.
//!
//! Per-operation failures (a rejected handshake, a failed push) reject
//! that call. Connection-level failures are global: they broadcast to the
//! [`Listeners`] registry and fail any in-flight acknowledgments with
//! [`Error::SocketClosed`]. This layer never reconnects on its own.

mod protocol;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use stratus_model::DeviceEvent;

use crate::error::Error;
use crate::listeners::{ConnectionEvent, ConnectionNotice, Listeners};
use self::protocol::ChannelMessage;

/// Callback invoked with each decoded inbound event on a joined room.
pub type EventHandler = Box<dyn Fn(DeviceEvent) + Send + Sync>;

// ── Room handle ──────────────────────────────────────────────────────

/// Handle to a joined room. Cheap to clone; all clones refer to the same
/// underlying channel (compare with [`same_channel`](Self::same_channel)).
#[derive(Debug, Clone)]
pub struct RoomHandle {
    inner: Arc<RoomShared>,
}

#[derive(Debug)]
struct RoomShared {
    room: String,
    topic: String,
    decode_failures: AtomicU64,
}

impl RoomHandle {
    fn new(room: &str, topic: &str) -> Self {
        Self {
            inner: Arc::new(RoomShared {
                room: room.to_owned(),
                topic: topic.to_owned(),
                decode_failures: AtomicU64::new(0),
            }),
        }
    }

    /// The room name this handle was joined with.
    pub fn room(&self) -> &str {
        &self.inner.room
    }

    /// The fully qualified topic (`rooms:{realm}:{room}`).
    pub fn topic(&self) -> &str {
        &self.inner.topic
    }

    /// Inbound payloads that failed decoding and were rejected.
    pub fn decode_failures(&self) -> u64 {
        self.inner.decode_failures.load(Ordering::Relaxed)
    }

    /// Whether two handles refer to the same joined channel.
    pub fn same_channel(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn note_decode_failure(&self) {
        self.inner.decode_failures.fetch_add(1, Ordering::Relaxed);
    }
}

// ── Manager ──────────────────────────────────────────────────────────

#[derive(Default)]
struct SocketState {
    conn: Option<Connection>,
    /// At most one handle per room name; entries added on successful join,
    /// removed on successful leave.
    rooms: HashMap<String, RoomHandle>,
}

/// Owns the socket state machine and the joined-room registry.
///
/// The `tokio` mutex is held across the whole open-and-join sequence, so a
/// concurrent join arriving while a socket open is in flight queues behind
/// it and then observes the opened socket (or the cached room handle)
/// instead of racing a duplicate connection.
pub(crate) struct ChannelManager {
    state: Mutex<SocketState>,
    listeners: Arc<Listeners>,
}

impl ChannelManager {
    pub(crate) fn new(listeners: Arc<Listeners>) -> Self {
        Self {
            state: Mutex::new(SocketState::default()),
            listeners,
        }
    }

    /// Join `room`, opening the socket first if absent. Idempotent: a
    /// joined room returns its cached handle without a second handshake.
    pub(crate) async fn join(
        &self,
        room: &str,
        topic: String,
        socket_url: Url,
    ) -> Result<RoomHandle, Error> {
        let mut state = self.state.lock().await;

        if let Some(handle) = state.rooms.get(room) {
            return Ok(handle.clone());
        }

        if state.conn.as_ref().is_none_or(Connection::is_closed) {
            // Room entries from a dead socket are stale; joining again
            // starts from a clean registry and a fresh connection.
            state.rooms.clear();
            state.conn = Some(Connection::open(&socket_url, Arc::clone(&self.listeners)).await?);
        }

        let Some(conn) = state.conn.as_ref() else {
            return Err(Error::SocketClosed);
        };

        conn.push(&topic, protocol::EVENT_JOIN, Value::Object(serde_json::Map::new()))
            .await?;

        let handle = RoomHandle::new(room, &topic);
        state.rooms.insert(room.to_owned(), handle.clone());
        Ok(handle)
    }

    /// Register an inbound-event handler on an already-joined room.
    pub(crate) async fn listen(&self, room: &str, handler: EventHandler) -> Result<(), Error> {
        let state = self.state.lock().await;
        let handle = state
            .rooms
            .get(room)
            .cloned()
            .ok_or_else(|| Error::RoomNotJoined { room: room.to_owned() })?;
        let conn = state.conn.as_ref().ok_or(Error::SocketClosed)?;
        conn.send(Command::Listen {
            topic: handle.topic().to_owned(),
            room: handle,
            handler,
        })
    }

    /// Push a volatile trigger registration on an already-joined room and
    /// wait for the channel's acknowledgment.
    pub(crate) async fn register_volatile_trigger(
        &self,
        room: &str,
        payload: Value,
    ) -> Result<(), Error> {
        let state = self.state.lock().await;
        let handle = state
            .rooms
            .get(room)
            .cloned()
            .ok_or_else(|| Error::RoomNotJoined { room: room.to_owned() })?;
        let conn = state.conn.as_ref().ok_or(Error::SocketClosed)?;
        conn.push(handle.topic(), protocol::EVENT_WATCH, payload).await?;
        Ok(())
    }

    /// Leave an already-joined room. The handle is removed only after the
    /// leave handshake succeeds.
    pub(crate) async fn leave(&self, room: &str) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        let handle = state
            .rooms
            .get(room)
            .cloned()
            .ok_or_else(|| Error::RoomNotJoined { room: room.to_owned() })?;
        let conn = state.conn.as_ref().ok_or(Error::SocketClosed)?;

        conn.push(handle.topic(), protocol::EVENT_LEAVE, Value::Object(serde_json::Map::new()))
            .await?;

        let _ = conn.send(Command::Unlisten {
            topic: handle.topic().to_owned(),
        });
        state.rooms.remove(room);
        Ok(())
    }
}

// ── Connection ───────────────────────────────────────────────────────

enum Command {
    Push {
        topic: String,
        event: String,
        payload: Value,
        ack: oneshot::Sender<Result<Value, Error>>,
    },
    Listen {
        topic: String,
        room: RoomHandle,
        handler: EventHandler,
    },
    Unlisten {
        topic: String,
    },
}

/// Handle to the background socket task.
struct Connection {
    cmd_tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
}

impl Connection {
    /// Open the websocket and spawn the read/write task.
    async fn open(url: &Url, listeners: Arc<Listeners>) -> Result<Self, Error> {
        // The URL carries the token as a query parameter; log host only.
        debug!(host = url.host_str().unwrap_or(""), "connecting rooms socket");

        let uri: tungstenite::http::Uri = url
            .as_str()
            .parse()
            .map_err(|e: tungstenite::http::uri::InvalidUri| Error::SocketConnect(e.to_string()))?;

        let (ws, _response) = tokio_tungstenite::connect_async(uri)
            .await
            .map_err(|e| Error::SocketConnect(e.to_string()))?;

        info!("rooms socket connected");

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(socket_task(ws, cmd_rx, listeners, cancel.clone()));

        Ok(Self { cmd_tx, cancel })
    }

    /// Whether the background task has exited (error, close, or shutdown).
    fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }

    fn send(&self, cmd: Command) -> Result<(), Error> {
        self.cmd_tx.send(cmd).map_err(|_| Error::SocketClosed)
    }

    /// Send a control push and await its acknowledgment.
    async fn push(&self, topic: &str, event: &str, payload: Value) -> Result<Value, Error> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.send(Command::Push {
            topic: topic.to_owned(),
            event: event.to_owned(),
            payload,
            ack: ack_tx,
        })?;
        ack_rx.await.map_err(|_| Error::SocketClosed)?
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background task ──────────────────────────────────────────────────

async fn socket_task<S>(
    ws: WebSocketStream<S>,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    listeners: Arc<Listeners>,
    cancel: CancellationToken,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut write, mut read) = ws.split();
    let mut next_ref: u64 = 0;
    let mut pending: HashMap<String, oneshot::Sender<Result<Value, Error>>> = HashMap::new();
    let mut handlers: HashMap<String, (RoomHandle, EventHandler)> = HashMap::new();

    let exit_notice = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                break None;
            }
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Push { topic, event, payload, ack }) => {
                    next_ref += 1;
                    let frame = ChannelMessage::push(&topic, &event, payload, next_ref);
                    match frame.encode() {
                        Ok(text) => {
                            if let Err(e) = write.send(Message::Text(text.into())).await {
                                let _ = ack.send(Err(Error::SocketConnect(e.to_string())));
                                break Some(ConnectionNotice {
                                    event: ConnectionEvent::SocketError,
                                    detail: e.to_string(),
                                });
                            }
                            pending.insert(next_ref.to_string(), ack);
                        }
                        Err(e) => {
                            let _ = ack.send(Err(e));
                        }
                    }
                }
                Some(Command::Listen { topic, room, handler }) => {
                    handlers.insert(topic, (room, handler));
                }
                Some(Command::Unlisten { topic }) => {
                    handlers.remove(&topic);
                }
                // Manager dropped; nothing left to serve.
                None => break None,
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    dispatch_frame(text.as_str(), &mut pending, &handlers);
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    // tungstenite answers pings on its own
                }
                Some(Ok(Message::Close(frame))) => {
                    let detail = frame.map_or_else(
                        || "socket closed".to_owned(),
                        |cf| format!("socket closed (code {}): {}", cf.code, cf.reason),
                    );
                    break Some(ConnectionNotice {
                        event: ConnectionEvent::SocketClose,
                        detail,
                    });
                }
                Some(Ok(_)) => {
                    // Binary frames are not part of the protocol
                }
                Some(Err(e)) => {
                    break Some(ConnectionNotice {
                        event: ConnectionEvent::SocketError,
                        detail: e.to_string(),
                    });
                }
                None => {
                    break Some(ConnectionNotice {
                        event: ConnectionEvent::SocketClose,
                        detail: "socket stream ended".to_owned(),
                    });
                }
            }
        }
    };

    // In-flight pushes reject locally; the connection-level failure itself
    // goes to the listener registry, not to any one caller.
    for (_, ack) in pending.drain() {
        let _ = ack.send(Err(Error::SocketClosed));
    }
    if let Some(notice) = exit_notice {
        match notice.event {
            ConnectionEvent::SocketError => {
                tracing::warn!(detail = %notice.detail, "rooms socket error");
            }
            ConnectionEvent::SocketClose => {
                tracing::info!(detail = %notice.detail, "rooms socket closed");
            }
        }
        listeners.emit(&notice);
    }
}

/// Route one inbound text frame: acknowledgments to their waiting pushes,
/// events to their room handler. Payloads that fail decoding are rejected
/// here, in the channel layer -- the handler never sees them.
fn dispatch_frame(
    text: &str,
    pending: &mut HashMap<String, oneshot::Sender<Result<Value, Error>>>,
    handlers: &HashMap<String, (RoomHandle, EventHandler)>,
) {
    let msg = match ChannelMessage::decode(text) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unparseable socket frame");
            return;
        }
    };

    match msg.event.as_str() {
        protocol::EVENT_REPLY => {
            let Some(push_ref) = msg.push_ref else {
                tracing::debug!("reply frame without ref");
                return;
            };
            if let Some(ack) = pending.remove(&push_ref) {
                let _ = ack.send(protocol::parse_reply(&msg.payload));
            }
        }
        protocol::EVENT_NEW => {
            let Some((room, handler)) = handlers.get(&msg.topic) else {
                return;
            };
            match DeviceEvent::from_payload(&msg.payload) {
                Ok(event) => handler(event),
                Err(e) => {
                    room.note_decode_failure();
                    tracing::error!(
                        room = room.room(),
                        error = %e,
                        "rejecting undecodable room event"
                    );
                }
            }
        }
        other => tracing::trace!(event = other, "unhandled socket event"),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
