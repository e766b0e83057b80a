use thiserror::Error;

/// Failure to map a wire DTO into its domain representation (or back).
///
/// These are data errors, not transport errors: the payload arrived intact
/// but does not describe a valid resource.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// A field carried a value outside its closed vocabulary
    /// (e.g. an unknown interface type or trigger operator).
    #[error("unknown value {value:?} for field `{field}`")]
    UnknownValue { field: &'static str, value: String },

    /// A field the domain model requires was absent or null.
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    /// A timestamp string failed RFC 3339 parsing.
    #[error("invalid timestamp in `{field}`: {source}")]
    InvalidTimestamp {
        field: &'static str,
        source: chrono::ParseError,
    },

    /// A realtime event payload did not match any known event shape.
    #[error("undecodable event payload: {reason}")]
    EventDecode { reason: String },
}
