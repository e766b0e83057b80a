// Trigger endpoints (registry plane)

use stratus_model::{Trigger, TriggerDto};

use crate::client::{Client, ensure_non_empty};
use crate::endpoints::encode_segment;
use crate::error::Error;

impl Client {
    /// List the names of all installed triggers.
    ///
    /// `GET v1/{realm}/triggers`
    pub async fn list_trigger_names(&self) -> Result<Vec<String>, Error> {
        let url = self.endpoints().triggers.render(&[("realm", &self.realm())]);
        self.get(&url).await
    }

    /// Fetch one trigger by name.
    ///
    /// `GET v1/{realm}/triggers/{triggerName}`
    pub async fn get_trigger(&self, trigger_name: &str) -> Result<Trigger, Error> {
        ensure_non_empty(trigger_name, "trigger name")?;
        let url = self.endpoints().trigger.render(&[
            ("realm", &self.realm()),
            ("triggerName", &encode_segment(trigger_name)),
        ]);
        let dto: TriggerDto = self.get(&url).await?;
        Ok(Trigger::try_from(dto)?)
    }

    /// Install a trigger.
    ///
    /// `POST v1/{realm}/triggers`
    pub async fn install_trigger(&self, trigger: &Trigger) -> Result<Trigger, Error> {
        ensure_non_empty(&trigger.name, "trigger name")?;
        let url = self.endpoints().triggers.render(&[("realm", &self.realm())]);
        let dto: TriggerDto = self.post(&url, &TriggerDto::from(trigger)).await?;
        Ok(Trigger::try_from(dto)?)
    }

    /// Delete a trigger by name.
    ///
    /// `DELETE v1/{realm}/triggers/{triggerName}`
    pub async fn delete_trigger(&self, trigger_name: &str) -> Result<(), Error> {
        ensure_non_empty(trigger_name, "trigger name")?;
        let url = self.endpoints().trigger.render(&[
            ("realm", &self.realm()),
            ("triggerName", &encode_segment(trigger_name)),
        ]);
        self.delete(&url).await
    }
}
