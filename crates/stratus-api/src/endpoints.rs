// Endpoint URL templates.
//
// Each logical backend operation gets one `Endpoint`: a base URL captured
// at construction plus an ordered list of literal/parameter path segments.
// Rendering is a pure substitution -- no hidden state, no validation. A
// parameter missing from the supplied record renders as an empty segment,
// which produces a malformed URL; that is a caller programming error, not
// a handled failure.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::config::ApiConfig;
use crate::error::Error;

// ── Path-segment escaping ────────────────────────────────────────────

/// Escape everything except RFC 3986 unreserved characters.
const SEGMENT_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a value for use as a single path segment.
pub(crate) fn encode_segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT_ESCAPE).to_string()
}

/// Percent-encode twice.
///
/// Group names go through a second decoding pass on the backend, so they
/// must be encoded twice to survive it. Compatibility requirement -- do
/// not "fix".
pub(crate) fn double_encode_segment(raw: &str) -> String {
    encode_segment(&encode_segment(raw))
}

// ── Endpoint template ────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Segment {
    Lit(String),
    Param(String),
}

/// A parameterized URL template: base URL + ordered path segments.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    base: String,
    segments: Vec<Segment>,
}

impl Endpoint {
    /// Parse a template like `"v1/{realm}/devices/{deviceId}"` against a
    /// base URL. Brace-wrapped segments become named parameters.
    fn new(base: &str, template: &str) -> Self {
        let segments = template
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .map_or_else(|| Segment::Lit(s.to_owned()), |name| Segment::Param(name.to_owned()))
            })
            .collect();

        Self {
            base: base.trim_end_matches('/').to_owned(),
            segments,
        }
    }

    /// Substitute named parameters and join onto the base URL.
    ///
    /// Values must already be escaped for path use where needed.
    pub(crate) fn render(&self, params: &[(&str, &str)]) -> String {
        let mut url = self.base.clone();
        for segment in &self.segments {
            url.push('/');
            match segment {
                Segment::Lit(lit) => url.push_str(lit),
                Segment::Param(name) => {
                    let value = params
                        .iter()
                        .find(|(key, _)| key == name)
                        .map_or("", |(_, value)| *value);
                    url.push_str(value);
                }
            }
        }
        url
    }
}

// ── Endpoint table ───────────────────────────────────────────────────

/// One entry per logical backend operation, built once at client
/// construction from the four configured base URLs. The realm is a
/// parameter of every render call, so a credential update after
/// construction is honored.
#[derive(Debug, Clone)]
pub(crate) struct EndpointTable {
    // Registry plane
    pub interfaces: Endpoint,
    pub interface_majors: Endpoint,
    pub interface: Endpoint,
    pub triggers: Endpoint,
    pub trigger: Endpoint,
    pub policies: Endpoint,
    pub policy: Endpoint,
    pub registry_health: Endpoint,

    // Data plane
    pub devices: Endpoint,
    pub device: Endpoint,
    pub device_interface_data: Endpoint,
    pub groups: Endpoint,
    pub group_devices: Endpoint,
    pub group_device: Endpoint,
    pub data_health: Endpoint,

    // Pairing plane
    pub registration: Endpoint,
    pub device_credentials: Endpoint,
    pub pairing_health: Endpoint,

    // Flow plane
    pub pipelines: Endpoint,
    pub pipeline: Endpoint,
    pub flows: Endpoint,
    pub flow: Endpoint,
    pub blocks: Endpoint,
    pub block: Endpoint,
    pub flow_health: Endpoint,

    /// Data-plane base the rooms socket hangs off.
    socket_base: String,
}

impl EndpointTable {
    pub(crate) fn new(config: &ApiConfig) -> Self {
        let registry = config.registry_api_url.as_str();
        let data = config.data_api_url.as_str();
        let pairing = config.pairing_api_url.as_str();
        let flow = config.flow_api_url.as_str();

        Self {
            interfaces: Endpoint::new(registry, "v1/{realm}/interfaces"),
            interface_majors: Endpoint::new(registry, "v1/{realm}/interfaces/{interfaceName}"),
            interface: Endpoint::new(registry, "v1/{realm}/interfaces/{interfaceName}/{interfaceMajor}"),
            triggers: Endpoint::new(registry, "v1/{realm}/triggers"),
            trigger: Endpoint::new(registry, "v1/{realm}/triggers/{triggerName}"),
            policies: Endpoint::new(registry, "v1/{realm}/policies"),
            policy: Endpoint::new(registry, "v1/{realm}/policies/{policyName}"),
            registry_health: Endpoint::new(registry, "health"),

            devices: Endpoint::new(data, "v1/{realm}/devices"),
            device: Endpoint::new(data, "v1/{realm}/devices/{deviceId}"),
            device_interface_data: Endpoint::new(
                data,
                "v1/{realm}/devices/{deviceId}/interfaces/{interfaceName}",
            ),
            groups: Endpoint::new(data, "v1/{realm}/groups"),
            group_devices: Endpoint::new(data, "v1/{realm}/groups/{groupName}/devices"),
            group_device: Endpoint::new(data, "v1/{realm}/groups/{groupName}/devices/{deviceId}"),
            data_health: Endpoint::new(data, "health"),

            registration: Endpoint::new(pairing, "v1/{realm}/agent/devices"),
            device_credentials: Endpoint::new(pairing, "v1/{realm}/agent/devices/{deviceId}"),
            pairing_health: Endpoint::new(pairing, "health"),

            pipelines: Endpoint::new(flow, "v1/{realm}/pipelines"),
            pipeline: Endpoint::new(flow, "v1/{realm}/pipelines/{pipelineName}"),
            flows: Endpoint::new(flow, "v1/{realm}/flows"),
            flow: Endpoint::new(flow, "v1/{realm}/flows/{flowName}"),
            blocks: Endpoint::new(flow, "v1/{realm}/blocks"),
            block: Endpoint::new(flow, "v1/{realm}/blocks/{blockName}"),
            flow_health: Endpoint::new(flow, "health"),

            socket_base: data.trim_end_matches('/').to_owned(),
        }
    }

    /// Websocket URL for the rooms socket, derived from the data-plane base
    /// with the scheme mapped to `ws`/`wss` and live credentials attached
    /// as query parameters.
    pub(crate) fn socket_url(&self, realm: &str, token: &str) -> Result<Url, Error> {
        let mut url = Url::parse(&self.socket_base)?;

        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::SocketConnect(format!("cannot derive socket scheme from `{}`", self.socket_base)))?;

        let path = format!("{}/v1/socket/websocket", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.query_pairs_mut()
            .clear()
            .append_pair("realm", realm)
            .append_pair("token", token)
            .append_pair("vsn", "1.0.0");

        Ok(url)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
