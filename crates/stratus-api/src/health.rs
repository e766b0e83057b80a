// Health probes, one per API plane. A 2xx response means the plane is up;
// anything else surfaces as the usual API/transport error.

use crate::client::Client;
use crate::error::Error;

impl Client {
    /// `GET {registry}/health`
    pub async fn registry_health(&self) -> Result<(), Error> {
        let url = self.endpoints().registry_health.render(&[]);
        self.probe(&url).await
    }

    /// `GET {data}/health`
    pub async fn data_health(&self) -> Result<(), Error> {
        let url = self.endpoints().data_health.render(&[]);
        self.probe(&url).await
    }

    /// `GET {pairing}/health`
    pub async fn pairing_health(&self) -> Result<(), Error> {
        let url = self.endpoints().pairing_health.render(&[]);
        self.probe(&url).await
    }

    /// `GET {flow}/health`
    pub async fn flow_health(&self) -> Result<(), Error> {
        let url = self.endpoints().flow_health.render(&[]);
        self.probe(&url).await
    }
}
