// Control-plane API client
//
// Wraps `reqwest::Client` with bearer authentication, the `{"data": ...}`
// request/response envelope, and endpoint-table URL construction. Resource
// endpoints (interfaces, devices, groups, etc.) are implemented as inherent
// methods via separate files to keep this module focused on transport
// mechanics.

use std::sync::{Arc, RwLock};

use reqwest::Method;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use stratus_model::DeviceEvent;

use crate::config::{ApiConfig, Credentials};
use crate::endpoints::EndpointTable;
use crate::error::Error;
use crate::listeners::{ConnectionEvent, ConnectionListener, Listeners};
use crate::realtime::{ChannelManager, EventHandler, RoomHandle};
use crate::transport::TransportConfig;

// ── Envelopes ────────────────────────────────────────────────────────

/// Response envelope: every 2xx payload arrives as `{ "data": ... }`.
#[derive(serde::Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Request envelope mirroring the backend's expected shape.
#[derive(serde::Serialize)]
struct RequestEnvelope<'a, T: Serialize> {
    data: &'a T,
}

/// Error body: `{ "errors": { "detail": "...", ... } }`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Value,
}

// ── Precondition helpers ─────────────────────────────────────────────

/// Fail fast on identifiers the backend requires as non-empty path
/// segments, instead of issuing a malformed request.
pub(crate) fn ensure_non_empty(value: &str, what: &'static str) -> Result<(), Error> {
    if value.trim().is_empty() {
        Err(Error::EmptyIdentifier { what })
    } else {
        Ok(())
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Stratus control plane.
///
/// One instance serves all four API planes plus the realtime rooms
/// socket. Credentials are live state: [`set_credentials`](Self::set_credentials)
/// affects every subsequent call.
pub struct Client {
    http: reqwest::Client,
    endpoints: EndpointTable,
    credentials: RwLock<Credentials>,
    listeners: Arc<Listeners>,
    rooms: ChannelManager,
}

impl Client {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from configuration and transport settings.
    pub fn new(config: &ApiConfig, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_http(config, http))
    }

    /// Wrap an existing `reqwest::Client` (tests, custom TLS stacks).
    pub fn with_http(config: &ApiConfig, http: reqwest::Client) -> Self {
        let listeners = Arc::new(Listeners::new());
        Self {
            http,
            endpoints: EndpointTable::new(config),
            credentials: RwLock::new(config.credentials()),
            rooms: ChannelManager::new(Arc::clone(&listeners)),
            listeners,
        }
    }

    // ── Credentials ──────────────────────────────────────────────────

    /// Replace the live realm/token pair. `None` resets both to empty.
    pub fn set_credentials(&self, credentials: Option<Credentials>) {
        let mut guard = self.credentials.write().expect("credentials lock poisoned");
        *guard = credentials.unwrap_or_default();
    }

    /// The realm all requests are currently scoped to.
    pub fn realm(&self) -> String {
        self.credentials
            .read()
            .expect("credentials lock poisoned")
            .realm
            .clone()
    }

    fn token(&self) -> String {
        self.credentials
            .read()
            .expect("credentials lock poisoned")
            .token
            .expose_secret()
            .to_owned()
    }

    fn auth(&self) -> (String, String) {
        let guard = self.credentials.read().expect("credentials lock poisoned");
        (guard.realm.clone(), guard.token.expose_secret().to_owned())
    }

    pub(crate) fn endpoints(&self) -> &EndpointTable {
        &self.endpoints
    }

    // ── Request primitives ───────────────────────────────────────────

    fn request(&self, method: Method, url: &str) -> Result<reqwest::RequestBuilder, Error> {
        let url = Url::parse(url)?;
        debug!("{method} {url}");
        Ok(self.http.request(method, url).bearer_auth(self.token()))
    }

    /// GET, unwrapping the `data` envelope.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let resp = self.request(Method::GET, url)?.send().await?;
        Self::handle_response(resp).await
    }

    /// GET with query parameters, unwrapping the `data` envelope.
    pub(crate) async fn get_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let resp = self.request(Method::GET, url)?.query(query).send().await?;
        Self::handle_response(resp).await
    }

    /// GET returning the whole response document -- for endpoints whose
    /// envelope carries more than `data` (e.g. pagination links).
    pub(crate) async fn get_document<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let resp = self.request(Method::GET, url)?.query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(status, resp).await);
        }
        let body = resp.text().await?;
        Self::decode_body(&body)
    }

    /// POST with the `{"data": ...}` request envelope, unwrapping the
    /// response envelope.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, Error> {
        let resp = self
            .request(Method::POST, url)?
            .json(&RequestEnvelope { data: body })
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    /// POST where the caller only needs a success signal.
    pub(crate) async fn post_empty<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<(), Error> {
        let resp = self
            .request(Method::POST, url)?
            .json(&RequestEnvelope { data: body })
            .send()
            .await?;
        Self::handle_empty(resp).await
    }

    /// PUT with the request envelope, unwrapping the response envelope.
    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, Error> {
        let resp = self
            .request(Method::PUT, url)?
            .json(&RequestEnvelope { data: body })
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    /// PUT where the backend replies with no body.
    pub(crate) async fn put_empty<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<(), Error> {
        let resp = self
            .request(Method::PUT, url)?
            .json(&RequestEnvelope { data: body })
            .send()
            .await?;
        Self::handle_empty(resp).await
    }

    /// PATCH with `application/merge-patch+json`, for partial updates.
    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, Error> {
        let payload = serde_json::to_vec(&RequestEnvelope { data: body })?;
        let resp = self
            .request(Method::PATCH, url)?
            .header(reqwest::header::CONTENT_TYPE, "application/merge-patch+json")
            .body(payload)
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    /// DELETE, returning a plain success signal.
    pub(crate) async fn delete(&self, url: &str) -> Result<(), Error> {
        let resp = self.request(Method::DELETE, url)?.send().await?;
        Self::handle_empty(resp).await
    }

    /// Health probe: GET with no envelope, 2xx means healthy.
    pub(crate) async fn probe(&self, url: &str) -> Result<(), Error> {
        let resp = self.request(Method::GET, url)?.send().await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(status, resp).await);
        }
        let body = resp.text().await?;
        let envelope: Envelope<T> = Self::decode_body(&body)?;
        Ok(envelope.data)
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
        serde_json::from_str(body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.to_owned(),
            }
        })
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<ErrorBody>(&raw) {
            Ok(body) if !body.errors.is_null() => body
                .errors
                .get("detail")
                .and_then(Value::as_str)
                .map_or_else(|| body.errors.to_string(), str::to_owned),
            _ if raw.is_empty() => status.to_string(),
            _ => raw,
        };

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    // ── Realtime rooms ───────────────────────────────────────────────

    /// Join a realtime room, lazily opening the socket on first use.
    ///
    /// Idempotent: joining an already-joined room returns the cached
    /// handle without a second handshake.
    pub async fn join_room(&self, room: &str) -> Result<RoomHandle, Error> {
        ensure_non_empty(room, "room name")?;
        let (realm, token) = self.auth();
        let topic = format!("rooms:{realm}:{room}");
        let socket_url = self.endpoints.socket_url(&realm, &token)?;
        self.rooms.join(room, topic, socket_url).await
    }

    /// Register a handler for decoded device events on a joined room.
    pub async fn listen(
        &self,
        room: &str,
        handler: impl Fn(DeviceEvent) + Send + Sync + 'static,
    ) -> Result<(), Error> {
        let handler: EventHandler = Box::new(handler);
        self.rooms.listen(room, handler).await
    }

    /// Register a volatile trigger on a joined room. The trigger lives
    /// only as long as the room subscription; nothing is persisted.
    pub async fn register_volatile_trigger(
        &self,
        room: &str,
        payload: Value,
    ) -> Result<(), Error> {
        self.rooms.register_volatile_trigger(room, payload).await
    }

    /// Leave a joined room. The cached handle is removed only after the
    /// leave handshake succeeds.
    pub async fn leave_room(&self, room: &str) -> Result<(), Error> {
        self.rooms.leave(room).await
    }

    // ── Connection-event listeners ───────────────────────────────────

    /// Subscribe a callback to a connection-lifecycle event.
    pub fn add_listener(&self, event: ConnectionEvent, listener: ConnectionListener) {
        self.listeners.add(event, listener);
    }

    /// Unsubscribe a previously added callback (by `Arc` identity).
    pub fn remove_listener(&self, event: ConnectionEvent, listener: &ConnectionListener) {
        self.listeners.remove(event, listener);
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifier_is_a_precondition_error() {
        let err = ensure_non_empty("", "group name").expect_err("empty must fail");
        assert!(err.is_precondition());
        assert!(err.to_string().contains("group name"));

        assert!(ensure_non_empty("  ", "device ID").is_err());
        assert!(ensure_non_empty("dev-1", "device ID").is_ok());
    }

    #[test]
    fn set_credentials_none_resets_to_empty() {
        let client = Client::with_http(&ApiConfig::default(), reqwest::Client::new());

        client.set_credentials(Some(Credentials {
            realm: "acme".to_owned(),
            token: secrecy::SecretString::from("t0ken".to_owned()),
        }));
        assert_eq!(client.realm(), "acme");

        client.set_credentials(None);
        assert_eq!(client.realm(), "");
        assert_eq!(client.token(), "");
    }

    #[test]
    fn realm_change_is_honored_by_the_endpoint_table() {
        let config = ApiConfig {
            data_api_url: "https://data.example".to_owned(),
            ..ApiConfig::default()
        };
        let client = Client::with_http(&config, reqwest::Client::new());

        client.set_credentials(Some(Credentials {
            realm: "globex".to_owned(),
            token: secrecy::SecretString::from(String::new()),
        }));

        let url = client.endpoints().devices.render(&[("realm", &client.realm())]);
        assert_eq!(url, "https://data.example/v1/globex/devices");
    }
}
