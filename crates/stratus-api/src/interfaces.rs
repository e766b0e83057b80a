// Interface endpoints (registry plane)
//
// Install, version, and retire the typed contracts devices speak.

use stratus_model::{Interface, InterfaceDto};

use crate::client::{Client, ensure_non_empty};
use crate::endpoints::encode_segment;
use crate::error::Error;

impl Client {
    /// List the names of all installed interfaces.
    ///
    /// `GET v1/{realm}/interfaces`
    pub async fn list_interface_names(&self) -> Result<Vec<String>, Error> {
        let url = self.endpoints().interfaces.render(&[("realm", &self.realm())]);
        self.get(&url).await
    }

    /// List the available major versions of one interface.
    ///
    /// `GET v1/{realm}/interfaces/{interfaceName}`
    pub async fn list_interface_majors(&self, interface_name: &str) -> Result<Vec<u32>, Error> {
        ensure_non_empty(interface_name, "interface name")?;
        let url = self.endpoints().interface_majors.render(&[
            ("realm", &self.realm()),
            ("interfaceName", &encode_segment(interface_name)),
        ]);
        self.get(&url).await
    }

    /// Fetch one interface definition by name and major version.
    ///
    /// `GET v1/{realm}/interfaces/{interfaceName}/{interfaceMajor}`
    pub async fn get_interface(&self, interface_name: &str, major: u32) -> Result<Interface, Error> {
        ensure_non_empty(interface_name, "interface name")?;
        let url = self.endpoints().interface.render(&[
            ("realm", &self.realm()),
            ("interfaceName", &encode_segment(interface_name)),
            ("interfaceMajor", &major.to_string()),
        ]);
        let dto: InterfaceDto = self.get(&url).await?;
        Ok(Interface::try_from(dto)?)
    }

    /// Install a new interface (or a new major of an existing one).
    ///
    /// `POST v1/{realm}/interfaces`
    pub async fn install_interface(&self, interface: &Interface) -> Result<Interface, Error> {
        ensure_non_empty(&interface.name, "interface name")?;
        let url = self.endpoints().interfaces.render(&[("realm", &self.realm())]);
        let dto: InterfaceDto = self.post(&url, &InterfaceDto::from(interface)).await?;
        Ok(Interface::try_from(dto)?)
    }

    /// Replace an interface definition at its versioned path. Only minor
    /// bumps are accepted by the backend.
    ///
    /// `PUT v1/{realm}/interfaces/{interfaceName}/{interfaceMajor}`
    pub async fn update_interface(&self, interface: &Interface) -> Result<(), Error> {
        ensure_non_empty(&interface.name, "interface name")?;
        let url = self.endpoints().interface.render(&[
            ("realm", &self.realm()),
            ("interfaceName", &encode_segment(&interface.name)),
            ("interfaceMajor", &interface.major.to_string()),
        ]);
        self.put_empty(&url, &InterfaceDto::from(interface)).await
    }

    /// Delete an interface major.
    ///
    /// `DELETE v1/{realm}/interfaces/{interfaceName}/{interfaceMajor}`
    pub async fn delete_interface(&self, interface_name: &str, major: u32) -> Result<(), Error> {
        ensure_non_empty(interface_name, "interface name")?;
        let url = self.endpoints().interface.render(&[
            ("realm", &self.realm()),
            ("interfaceName", &encode_segment(interface_name)),
            ("interfaceMajor", &major.to_string()),
        ]);
        self.delete(&url).await
    }
}
