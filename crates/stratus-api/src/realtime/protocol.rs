// Wire protocol for the rooms socket.
//
// A topic-based channel protocol over one upgradable connection. Every
// frame is a JSON object `{topic, event, payload, ref}`. Control events
// (`phx_join`, `phx_leave`, `watch`) are acknowledged by a `phx_reply`
// carrying `{status: "ok" | "error", response}` under the same ref.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

pub(crate) const EVENT_JOIN: &str = "phx_join";
pub(crate) const EVENT_LEAVE: &str = "phx_leave";
pub(crate) const EVENT_REPLY: &str = "phx_reply";
pub(crate) const EVENT_WATCH: &str = "watch";
pub(crate) const EVENT_NEW: &str = "new_event";

/// A single frame on the rooms socket, outbound or inbound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChannelMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub push_ref: Option<String>,
}

impl ChannelMessage {
    pub(crate) fn push(topic: &str, event: &str, payload: Value, push_ref: u64) -> Self {
        Self {
            topic: topic.to_owned(),
            event: event.to_owned(),
            payload,
            push_ref: Some(push_ref.to_string()),
        }
    }

    pub(crate) fn encode(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::SocketConnect(format!("frame encode: {e}")))
    }

    pub(crate) fn decode(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::SocketConnect(format!("frame decode: {e}")))
    }
}

/// Acknowledgment payload inside a `phx_reply` frame.
#[derive(Debug, Deserialize)]
struct Reply {
    status: String,
    #[serde(default)]
    response: Value,
}

/// Interpret a `phx_reply` payload: `ok` yields the response value,
/// anything else is a channel rejection.
pub(crate) fn parse_reply(payload: &Value) -> Result<Value, Error> {
    let reply: Reply =
        serde_json::from_value(payload.clone()).map_err(|e| Error::ChannelReply {
            message: format!("malformed reply: {e}"),
        })?;

    if reply.status == "ok" {
        Ok(reply.response)
    } else {
        Err(Error::ChannelReply {
            message: if reply.response.is_null() {
                reply.status
            } else {
                reply.response.to_string()
            },
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────
