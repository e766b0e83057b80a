// Pairing endpoints: device registration and credential wipe.

use serde_json::json;

use crate::client::{Client, ensure_non_empty};
use crate::endpoints::encode_segment;
use crate::error::Error;

#[derive(serde::Deserialize)]
struct RegistrationResponse {
    credentials_secret: String,
}

impl Client {
    /// Register a device, returning the credentials secret it will use to
    /// obtain its transport certificates. The secret is shown exactly once.
    ///
    /// `POST v1/{realm}/agent/devices`
    pub async fn register_device(&self, device_id: &str) -> Result<String, Error> {
        ensure_non_empty(device_id, "device ID")?;
        let url = self.endpoints().registration.render(&[("realm", &self.realm())]);
        let response: RegistrationResponse =
            self.post(&url, &json!({ "hw_id": device_id })).await?;
        Ok(response.credentials_secret)
    }

    /// Wipe a device's credentials so it must re-register before
    /// connecting again.
    ///
    /// `DELETE v1/{realm}/agent/devices/{deviceId}`
    pub async fn wipe_device_credentials(&self, device_id: &str) -> Result<(), Error> {
        ensure_non_empty(device_id, "device ID")?;
        let url = self.endpoints().device_credentials.render(&[
            ("realm", &self.realm()),
            ("deviceId", &encode_segment(device_id)),
        ]);
        self.delete(&url).await
    }
}
