// Trigger delivery-policy endpoints (registry plane)

use stratus_model::{DeliveryPolicy, DeliveryPolicyDto};

use crate::client::{Client, ensure_non_empty};
use crate::endpoints::encode_segment;
use crate::error::Error;

impl Client {
    /// List the names of all installed delivery policies.
    ///
    /// `GET v1/{realm}/policies`
    pub async fn list_policy_names(&self) -> Result<Vec<String>, Error> {
        let url = self.endpoints().policies.render(&[("realm", &self.realm())]);
        self.get(&url).await
    }

    /// Fetch one delivery policy by name.
    ///
    /// `GET v1/{realm}/policies/{policyName}`
    pub async fn get_policy(&self, policy_name: &str) -> Result<DeliveryPolicy, Error> {
        ensure_non_empty(policy_name, "policy name")?;
        let url = self.endpoints().policy.render(&[
            ("realm", &self.realm()),
            ("policyName", &encode_segment(policy_name)),
        ]);
        let dto: DeliveryPolicyDto = self.get(&url).await?;
        Ok(DeliveryPolicy::try_from(dto)?)
    }

    /// Install a delivery policy.
    ///
    /// `POST v1/{realm}/policies`
    pub async fn install_policy(&self, policy: &DeliveryPolicy) -> Result<DeliveryPolicy, Error> {
        ensure_non_empty(&policy.name, "policy name")?;
        let url = self.endpoints().policies.render(&[("realm", &self.realm())]);
        let dto: DeliveryPolicyDto = self.post(&url, &DeliveryPolicyDto::from(policy)).await?;
        Ok(DeliveryPolicy::try_from(dto)?)
    }

    /// Delete a delivery policy by name. Fails while any trigger still
    /// references it; the backend reports that as a conflict.
    ///
    /// `DELETE v1/{realm}/policies/{policyName}`
    pub async fn delete_policy(&self, policy_name: &str) -> Result<(), Error> {
        ensure_non_empty(policy_name, "policy name")?;
        let url = self.endpoints().policy.render(&[
            ("realm", &self.realm()),
            ("policyName", &encode_segment(policy_name)),
        ]);
        self.delete(&url).await
    }
}
