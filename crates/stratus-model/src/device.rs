// Device status as reported by the data plane. The DTO keeps timestamps as
// RFC 3339 strings; conversion parses them so downstream code works with
// `DateTime<Utc>` throughout.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TransformError;

// ── Domain types ─────────────────────────────────────────────────────

/// A device registered in a realm.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: String,
    pub aliases: IndexMap<String, String>,
    pub attributes: IndexMap<String, String>,
    pub connected: bool,
    pub credentials_inhibited: bool,
    pub last_connection: Option<DateTime<Utc>>,
    pub last_disconnection: Option<DateTime<Utc>>,
    pub first_registration: Option<DateTime<Utc>>,
    /// Installed interfaces: name -> version descriptor.
    pub introspection: IndexMap<String, InterfaceVersion>,
    pub total_received_msgs: u64,
    pub total_received_bytes: u64,
}

/// Version descriptor from a device's introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceVersion {
    pub major: u32,
    pub minor: u32,
}

impl Device {
    /// Look up the installed version of an interface by name.
    pub fn interface_version(&self, name: &str) -> Option<InterfaceVersion> {
        self.introspection.get(name).copied()
    }
}

// ── Wire DTO ─────────────────────────────────────────────────────────

/// Wire shape of a device status document.
///
/// Counters and maps default to empty because older backends omit them
/// for devices that never connected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDto {
    pub id: String,
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub credentials_inhibited: bool,
    #[serde(default)]
    pub last_connection: Option<String>,
    #[serde(default)]
    pub last_disconnection: Option<String>,
    #[serde(default)]
    pub first_registration: Option<String>,
    #[serde(default)]
    pub introspection: IndexMap<String, InterfaceVersion>,
    #[serde(default)]
    pub total_received_msgs: u64,
    #[serde(default)]
    pub total_received_bytes: u64,
}

// ── Conversions ──────────────────────────────────────────────────────

fn parse_timestamp(
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<DateTime<Utc>>, TransformError> {
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|source| TransformError::InvalidTimestamp { field, source })
    })
    .transpose()
}

impl TryFrom<DeviceDto> for Device {
    type Error = TransformError;

    fn try_from(dto: DeviceDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: dto.id,
            aliases: dto.aliases,
            attributes: dto.attributes,
            connected: dto.connected,
            credentials_inhibited: dto.credentials_inhibited,
            last_connection: parse_timestamp("last_connection", dto.last_connection)?,
            last_disconnection: parse_timestamp("last_disconnection", dto.last_disconnection)?,
            first_registration: parse_timestamp("first_registration", dto.first_registration)?,
            introspection: dto.introspection,
            total_received_msgs: dto.total_received_msgs,
            total_received_bytes: dto.total_received_bytes,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────
