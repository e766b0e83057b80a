// Group endpoints (data plane)
//
// Group names may contain reserved URL characters and the backend decodes
// group path segments twice, so names are double-percent-encoded here.
// Empty identifiers are rejected before any request goes out.

use serde_json::json;

use stratus_model::{Device, DeviceDto};

use crate::client::{Client, ensure_non_empty};
use crate::endpoints::{double_encode_segment, encode_segment};
use crate::error::Error;

impl Client {
    /// List the names of all device groups in the realm.
    ///
    /// `GET v1/{realm}/groups`
    pub async fn list_groups(&self) -> Result<Vec<String>, Error> {
        let url = self.endpoints().groups.render(&[("realm", &self.realm())]);
        self.get(&url).await
    }

    /// Create a group containing the given devices.
    ///
    /// `POST v1/{realm}/groups`
    pub async fn create_group(
        &self,
        group_name: &str,
        device_ids: &[String],
    ) -> Result<(), Error> {
        ensure_non_empty(group_name, "group name")?;
        let url = self.endpoints().groups.render(&[("realm", &self.realm())]);
        self.post_empty(&url, &json!({ "group_name": group_name, "devices": device_ids }))
            .await
    }

    /// List the devices belonging to a group, with full status documents.
    ///
    /// `GET v1/{realm}/groups/{groupName}/devices?details=true`
    pub async fn list_devices_in_group(&self, group_name: &str) -> Result<Vec<Device>, Error> {
        ensure_non_empty(group_name, "group name")?;
        let url = self.endpoints().group_devices.render(&[
            ("realm", &self.realm()),
            ("groupName", &double_encode_segment(group_name)),
        ]);
        let dtos: Vec<DeviceDto> = self
            .get_with_query(&url, &[("details", "true".to_owned())])
            .await?;
        Ok(dtos
            .into_iter()
            .map(Device::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Add a device to a group.
    ///
    /// `POST v1/{realm}/groups/{groupName}/devices`
    pub async fn add_device_to_group(
        &self,
        group_name: &str,
        device_id: &str,
    ) -> Result<(), Error> {
        ensure_non_empty(group_name, "group name")?;
        ensure_non_empty(device_id, "device ID")?;
        let url = self.endpoints().group_devices.render(&[
            ("realm", &self.realm()),
            ("groupName", &double_encode_segment(group_name)),
        ]);
        self.post_empty(&url, &json!({ "device_id": device_id })).await
    }

    /// Remove a device from a group.
    ///
    /// `DELETE v1/{realm}/groups/{groupName}/devices/{deviceId}`
    pub async fn remove_device_from_group(
        &self,
        group_name: &str,
        device_id: &str,
    ) -> Result<(), Error> {
        ensure_non_empty(group_name, "group name")?;
        ensure_non_empty(device_id, "device ID")?;
        let url = self.endpoints().group_device.render(&[
            ("realm", &self.realm()),
            ("groupName", &double_encode_segment(group_name)),
            ("deviceId", &encode_segment(device_id)),
        ]);
        self.delete(&url).await
    }
}
