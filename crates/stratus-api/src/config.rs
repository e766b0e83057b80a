// Client configuration: the realm/token pair used for authentication and
// the four base URLs of the control-plane services.

use secrecy::SecretString;

/// Live authentication state: the tenant realm and its bearer token.
///
/// Held by the client behind a lock and re-read on every call, so a
/// credential update is honored by all subsequent requests.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub realm: String,
    pub token: SecretString,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            realm: String::new(),
            token: SecretString::from(String::new()),
        }
    }
}

/// Static configuration consumed at client construction.
///
/// Every field degrades to an empty string when absent: a missing base URL
/// does not fail construction, it just makes requests against that plane
/// fail with an invalid-URL error when first used.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub realm: String,
    pub token: SecretString,
    /// Data plane: device status, values, groups, and the rooms socket.
    pub data_api_url: String,
    /// Flow plane: pipelines, blocks, flow instances.
    pub flow_api_url: String,
    /// Pairing plane: device registration and credential wipe.
    pub pairing_api_url: String,
    /// Registry plane: interfaces, triggers, delivery policies.
    pub registry_api_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            realm: String::new(),
            token: SecretString::from(String::new()),
            data_api_url: String::new(),
            flow_api_url: String::new(),
            pairing_api_url: String::new(),
            registry_api_url: String::new(),
        }
    }
}

impl ApiConfig {
    /// The initial credential pair from this configuration.
    pub(crate) fn credentials(&self) -> Credentials {
        Credentials {
            realm: self.realm.clone(),
            token: self.token.clone(),
        }
    }
}
