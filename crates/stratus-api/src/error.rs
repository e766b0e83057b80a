use thiserror::Error;

/// Top-level error type for the `stratus-api` crate.
///
/// Covers every failure mode across the four API planes and the realtime
/// room layer. Consumers branch on variants; nothing here is retried or
/// recovered internally.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error. Usually means a base URL or path parameter was
    /// left empty -- a caller programming error, not a backend failure.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API status ──────────────────────────────────────────────────
    /// Structured error from a non-2xx API response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// JSON encoding of a request body failed.
    #[error("request encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    // ── Preconditions (raised before any network call) ──────────────
    /// A required path identifier was empty.
    #[error("{what} must not be empty")]
    EmptyIdentifier { what: &'static str },

    /// Operating on a room that was never joined.
    #[error("room `{room}` is not joined")]
    RoomNotJoined { room: String },

    /// Registering a block whose name collides with a built-in block.
    #[error("block name `{name}` collides with a built-in block")]
    BlockNameConflict { name: String },

    /// Built-in blocks ship with the platform and cannot be deleted.
    #[error("built-in block `{name}` cannot be deleted")]
    BuiltinBlock { name: String },

    // ── Domain lookup ───────────────────────────────────────────────
    /// An interface name was not found in a device's introspection.
    #[error("interface `{interface}` is not installed on device `{device_id}`")]
    InterfaceNotInstalled {
        interface: String,
        device_id: String,
    },

    // ── Data mapping ────────────────────────────────────────────────
    /// DTO-to-domain conversion or event decoding failed.
    #[error("transform error: {0}")]
    Transform(#[from] stratus_model::TransformError),

    // ── Realtime socket ─────────────────────────────────────────────
    /// Websocket connection failed.
    #[error("socket connection failed: {0}")]
    SocketConnect(String),

    /// The socket closed while an operation was in flight.
    #[error("socket closed")]
    SocketClosed,

    /// The channel acknowledged a push with an error reply.
    #[error("channel rejected the request: {message}")]
    ChannelReply { message: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying
    /// at a higher layer (this crate never retries).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::SocketConnect(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the failure was raised before any network call.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::EmptyIdentifier { .. }
                | Self::RoomNotJoined { .. }
                | Self::BlockNameConflict { .. }
                | Self::BuiltinBlock { .. }
        )
    }
}
