// Interface definitions: the typed contract a device and the platform
// agree on for exchanging data. The wire DTO keeps every enum-like field
// as a plain string (the backend is the source of truth for vocabularies);
// conversion into the domain type validates them.

use serde::{Deserialize, Serialize};

use crate::error::TransformError;

// ── Domain types ─────────────────────────────────────────────────────

/// An interface definition, versioned by `major.minor`.
#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub name: String,
    pub major: u32,
    pub minor: u32,
    pub kind: InterfaceKind,
    pub ownership: Ownership,
    pub aggregation: Aggregation,
    pub description: Option<String>,
    pub doc: Option<String>,
    pub mappings: Vec<Mapping>,
}

/// Whether the interface carries retained properties or a datastream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    Properties,
    Datastream,
}

/// Which side of the connection publishes on this interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Device,
    Server,
}

/// How datastream samples are grouped on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    #[default]
    Individual,
    Object,
}

/// A single mapping: one endpoint path and the value type it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub endpoint: String,
    pub value_type: MappingType,
    pub explicit_timestamp: bool,
    pub description: Option<String>,
}

/// Value types a mapping endpoint can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingType {
    Double,
    Integer,
    LongInteger,
    Boolean,
    String,
    BinaryBlob,
    DateTime,
    DoubleArray,
    IntegerArray,
    BooleanArray,
    StringArray,
}

impl Interface {
    /// Find the mapping whose endpoint matches `path`, if any.
    ///
    /// Parametric endpoint segments (`%{..}`) match any single path
    /// segment, so `/sensors/%{id}/value` matches `/sensors/kitchen/value`.
    pub fn mapping_for_path(&self, path: &str) -> Option<&Mapping> {
        self.mappings.iter().find(|m| m.matches_path(path))
    }
}

impl Mapping {
    /// Whether `path` matches this mapping's endpoint pattern.
    pub fn matches_path(&self, path: &str) -> bool {
        let pattern: Vec<&str> = self.endpoint.trim_matches('/').split('/').collect();
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        pattern.len() == segments.len()
            && pattern
                .iter()
                .zip(&segments)
                .all(|(pat, seg)| pat.starts_with("%{") || pat == seg)
    }
}

// ── Wire DTOs ────────────────────────────────────────────────────────

/// Wire shape of an interface definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceDto {
    pub interface_name: String,
    pub version_major: u32,
    pub version_minor: u32,
    #[serde(rename = "type")]
    pub interface_type: String,
    pub ownership: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    pub mappings: Vec<MappingDto>,
}

/// Wire shape of a single mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingDto {
    pub endpoint: String,
    #[serde(rename = "type")]
    pub mapping_type: String,
    #[serde(default)]
    pub explicit_timestamp: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ── Conversions ──────────────────────────────────────────────────────

impl TryFrom<InterfaceDto> for Interface {
    type Error = TransformError;

    fn try_from(dto: InterfaceDto) -> Result<Self, Self::Error> {
        let kind = match dto.interface_type.as_str() {
            "properties" => InterfaceKind::Properties,
            "datastream" => InterfaceKind::Datastream,
            other => {
                return Err(TransformError::UnknownValue {
                    field: "type",
                    value: other.to_owned(),
                });
            }
        };

        let ownership = match dto.ownership.as_str() {
            "device" => Ownership::Device,
            "server" => Ownership::Server,
            other => {
                return Err(TransformError::UnknownValue {
                    field: "ownership",
                    value: other.to_owned(),
                });
            }
        };

        let aggregation = match dto.aggregation.as_deref() {
            None | Some("individual") => Aggregation::Individual,
            Some("object") => Aggregation::Object,
            Some(other) => {
                return Err(TransformError::UnknownValue {
                    field: "aggregation",
                    value: other.to_owned(),
                });
            }
        };

        let mappings = dto
            .mappings
            .into_iter()
            .map(Mapping::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: dto.interface_name,
            major: dto.version_major,
            minor: dto.version_minor,
            kind,
            ownership,
            aggregation,
            description: dto.description,
            doc: dto.doc,
            mappings,
        })
    }
}

impl TryFrom<MappingDto> for Mapping {
    type Error = TransformError;

    fn try_from(dto: MappingDto) -> Result<Self, Self::Error> {
        let value_type = match dto.mapping_type.as_str() {
            "double" => MappingType::Double,
            "integer" => MappingType::Integer,
            "longinteger" => MappingType::LongInteger,
            "boolean" => MappingType::Boolean,
            "string" => MappingType::String,
            "binaryblob" => MappingType::BinaryBlob,
            "datetime" => MappingType::DateTime,
            "doublearray" => MappingType::DoubleArray,
            "integerarray" => MappingType::IntegerArray,
            "booleanarray" => MappingType::BooleanArray,
            "stringarray" => MappingType::StringArray,
            other => {
                return Err(TransformError::UnknownValue {
                    field: "mappings[].type",
                    value: other.to_owned(),
                });
            }
        };

        Ok(Self {
            endpoint: dto.endpoint,
            value_type,
            explicit_timestamp: dto.explicit_timestamp,
            description: dto.description,
        })
    }
}

impl From<&Interface> for InterfaceDto {
    fn from(interface: &Interface) -> Self {
        Self {
            interface_name: interface.name.clone(),
            version_major: interface.major,
            version_minor: interface.minor,
            interface_type: match interface.kind {
                InterfaceKind::Properties => "properties",
                InterfaceKind::Datastream => "datastream",
            }
            .to_owned(),
            ownership: match interface.ownership {
                Ownership::Device => "device",
                Ownership::Server => "server",
            }
            .to_owned(),
            aggregation: match interface.aggregation {
                Aggregation::Individual => None,
                Aggregation::Object => Some("object".to_owned()),
            },
            description: interface.description.clone(),
            doc: interface.doc.clone(),
            mappings: interface.mappings.iter().map(MappingDto::from).collect(),
        }
    }
}

impl From<&Mapping> for MappingDto {
    fn from(mapping: &Mapping) -> Self {
        Self {
            endpoint: mapping.endpoint.clone(),
            mapping_type: match mapping.value_type {
                MappingType::Double => "double",
                MappingType::Integer => "integer",
                MappingType::LongInteger => "longinteger",
                MappingType::Boolean => "boolean",
                MappingType::String => "string",
                MappingType::BinaryBlob => "binaryblob",
                MappingType::DateTime => "datetime",
                MappingType::DoubleArray => "doublearray",
                MappingType::IntegerArray => "integerarray",
                MappingType::BooleanArray => "booleanarray",
                MappingType::StringArray => "stringarray",
            }
            .to_owned(),
            explicit_timestamp: mapping.explicit_timestamp,
            description: mapping.description.clone(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
