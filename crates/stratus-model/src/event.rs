//! Realtime device events delivered over joined rooms.
//!
//! Inbound room payloads carry `{ device_id, timestamp, event: { type, .. } }`
//! where `event.type` selects the concrete shape. Decoding is strict: a
//! payload whose `type` is unknown (or whose fields don't match the tagged
//! shape) is a [`TransformError::EventDecode`], never a passthrough.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransformError;

/// A decoded realtime event from a device in the realm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub device_id: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub event: EventPayload,
}

/// The event body, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    DeviceConnected {
        device_ip_address: String,
    },
    DeviceDisconnected {},
    IncomingData {
        interface: String,
        path: String,
        value: Value,
    },
    ValueStored {
        interface: String,
        path: String,
        value: Value,
    },
    DeviceError {
        error_name: String,
        #[serde(default)]
        metadata: Value,
    },
}

impl DeviceEvent {
    /// Decode a raw room payload into a typed event.
    pub fn from_payload(payload: &Value) -> Result<Self, TransformError> {
        serde_json::from_value(payload.clone()).map_err(|e| TransformError::EventDecode {
            reason: e.to_string(),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────
