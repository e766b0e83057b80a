// Device endpoints (data plane)
//
// Status, aliases, attributes, credential inhibition, interface values,
// and the folded data tree. Device listing is token-paginated: the next
// page token is parsed out of the response's pagination link.

use serde_json::{Value, json};

use stratus_model::{Device, DeviceDto, Interface};

use crate::client::{Client, ensure_non_empty};
use crate::datatree::{self, DataTreeNode};
use crate::endpoints::encode_segment;
use crate::error::Error;

// ── Pagination ───────────────────────────────────────────────────────

/// One page of the device list plus the token for the next page.
/// `next_token == None` means this was the last page.
#[derive(Debug)]
pub struct DevicesPage {
    pub devices: Vec<Device>,
    pub next_token: Option<String>,
}

#[derive(serde::Deserialize)]
struct DeviceListDocument {
    data: Vec<DeviceDto>,
    #[serde(default)]
    links: Option<PageLinks>,
}

#[derive(serde::Deserialize)]
struct PageLinks {
    #[serde(default)]
    next: Option<String>,
}

/// Extract `from_token` from a pagination link like
/// `/v1/acme/devices?from_token=abc&limit=100`.
fn next_token_from_link(link: &str) -> Option<String> {
    let (_, query) = link.split_once('?')?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "from_token")
        .map(|(_, value)| value.into_owned())
}

// ── Interface reference ──────────────────────────────────────────────

/// How to identify the interface for a data-tree fetch: a full definition
/// (no extra lookups) or just a name (resolved via device introspection).
#[derive(Debug, Clone)]
pub enum InterfaceRef {
    Definition(Interface),
    Name(String),
}

// ── Endpoints ────────────────────────────────────────────────────────

impl Client {
    /// List devices in the realm, one page at a time.
    ///
    /// `GET v1/{realm}/devices?details=true&limit={limit}[&from_token=...]`
    pub async fn list_devices(
        &self,
        limit: u32,
        from_token: Option<&str>,
    ) -> Result<DevicesPage, Error> {
        let url = self.endpoints().devices.render(&[("realm", &self.realm())]);

        let mut query = vec![
            ("details", "true".to_owned()),
            ("limit", limit.to_string()),
        ];
        if let Some(token) = from_token {
            query.push(("from_token", token.to_owned()));
        }

        let document: DeviceListDocument = self.get_document(&url, &query).await?;

        let next_token = document
            .links
            .and_then(|links| links.next)
            .as_deref()
            .and_then(next_token_from_link);
        let devices = document
            .data
            .into_iter()
            .map(Device::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DevicesPage { devices, next_token })
    }

    /// Fetch one device's status document.
    ///
    /// `GET v1/{realm}/devices/{deviceId}`
    pub async fn get_device(&self, device_id: &str) -> Result<Device, Error> {
        ensure_non_empty(device_id, "device ID")?;
        let url = self.device_url(device_id);
        let dto: DeviceDto = self.get(&url).await?;
        Ok(Device::try_from(dto)?)
    }

    /// Remove a device and all of its stored data from the realm.
    ///
    /// `DELETE v1/{realm}/devices/{deviceId}`
    pub async fn delete_device(&self, device_id: &str) -> Result<(), Error> {
        ensure_non_empty(device_id, "device ID")?;
        let url = self.device_url(device_id);
        self.delete(&url).await
    }

    /// Set (or overwrite) one alias on a device.
    ///
    /// `PATCH v1/{realm}/devices/{deviceId}` (merge-patch)
    pub async fn set_device_alias(
        &self,
        device_id: &str,
        key: &str,
        value: &str,
    ) -> Result<Device, Error> {
        ensure_non_empty(device_id, "device ID")?;
        ensure_non_empty(key, "alias key")?;
        let url = self.device_url(device_id);
        let dto: DeviceDto = self.patch(&url, &json!({ "aliases": { key: value } })).await?;
        Ok(Device::try_from(dto)?)
    }

    /// Remove one alias from a device (merge-patch with a null value).
    pub async fn delete_device_alias(&self, device_id: &str, key: &str) -> Result<Device, Error> {
        ensure_non_empty(device_id, "device ID")?;
        ensure_non_empty(key, "alias key")?;
        let url = self.device_url(device_id);
        let dto: DeviceDto = self
            .patch(&url, &json!({ "aliases": { key: Value::Null } }))
            .await?;
        Ok(Device::try_from(dto)?)
    }

    /// Set (or overwrite) one attribute on a device.
    pub async fn set_device_attribute(
        &self,
        device_id: &str,
        key: &str,
        value: &str,
    ) -> Result<Device, Error> {
        ensure_non_empty(device_id, "device ID")?;
        ensure_non_empty(key, "attribute key")?;
        let url = self.device_url(device_id);
        let dto: DeviceDto = self
            .patch(&url, &json!({ "attributes": { key: value } }))
            .await?;
        Ok(Device::try_from(dto)?)
    }

    /// Remove one attribute from a device.
    pub async fn delete_device_attribute(
        &self,
        device_id: &str,
        key: &str,
    ) -> Result<Device, Error> {
        ensure_non_empty(device_id, "device ID")?;
        ensure_non_empty(key, "attribute key")?;
        let url = self.device_url(device_id);
        let dto: DeviceDto = self
            .patch(&url, &json!({ "attributes": { key: Value::Null } }))
            .await?;
        Ok(Device::try_from(dto)?)
    }

    /// Inhibit (or re-enable) a device's credential requests.
    pub async fn set_credentials_inhibition(
        &self,
        device_id: &str,
        inhibited: bool,
    ) -> Result<Device, Error> {
        ensure_non_empty(device_id, "device ID")?;
        let url = self.device_url(device_id);
        let dto: DeviceDto = self
            .patch(&url, &json!({ "credentials_inhibited": inhibited }))
            .await?;
        Ok(Device::try_from(dto)?)
    }

    /// Fetch the raw stored values for one interface of a device.
    ///
    /// `GET v1/{realm}/devices/{deviceId}/interfaces/{interfaceName}`
    pub async fn get_device_data(
        &self,
        device_id: &str,
        interface_name: &str,
    ) -> Result<Value, Error> {
        ensure_non_empty(device_id, "device ID")?;
        ensure_non_empty(interface_name, "interface name")?;
        let url = self.endpoints().device_interface_data.render(&[
            ("realm", &self.realm()),
            ("deviceId", &encode_segment(device_id)),
            ("interfaceName", &encode_segment(interface_name)),
        ]);
        self.get(&url).await
    }

    /// Fetch one interface's values folded into a hierarchical tree keyed
    /// by the interface's declared endpoint structure.
    ///
    /// Given only a name, the concrete definition is resolved through the
    /// device's introspection first; a name the device never announced is
    /// an [`Error::InterfaceNotInstalled`].
    pub async fn get_device_data_tree(
        &self,
        device_id: &str,
        interface: InterfaceRef,
    ) -> Result<DataTreeNode, Error> {
        ensure_non_empty(device_id, "device ID")?;

        let interface = match interface {
            InterfaceRef::Definition(interface) => interface,
            InterfaceRef::Name(name) => {
                ensure_non_empty(&name, "interface name")?;
                let device = self.get_device(device_id).await?;
                let version = device.interface_version(&name).ok_or_else(|| {
                    Error::InterfaceNotInstalled {
                        interface: name.clone(),
                        device_id: device_id.to_owned(),
                    }
                })?;
                self.get_interface(&name, version.major).await?
            }
        };

        let raw = self.get_device_data(device_id, &interface.name).await?;
        Ok(datatree::fold_interface_values(&interface, &raw))
    }

    fn device_url(&self, device_id: &str) -> String {
        self.endpoints().device.render(&[
            ("realm", &self.realm()),
            ("deviceId", &encode_segment(device_id)),
        ])
    }
}

// ── Tests ────────────────────────────────────────────────────────────
