//! Key pair management

use super::Ec2Client;
use super::types::{CreatedKeyPair, KeyMaterial, KeyPairSummary};
use crate::aws::error::{ClassifyExt, ProviderError};
use crate::aws::tags;
use aws_sdk_ec2::types::ResourceType;
use tracing::{debug, info};

impl Ec2Client {
    /// Create a key pair and return its private key material
    pub async fn create_key_pair(&self, key_name: &str) -> Result<CreatedKeyPair, ProviderError> {
        info!(key_name = %key_name, "Creating key pair");

        let response = self
            .client
            .create_key_pair()
            .key_name(key_name)
            .tag_specifications(tags::ec2_tag_spec(ResourceType::KeyPair, Some(key_name)))
            .send()
            .await
            .classify()?;

        let key_material = response.key_material().ok_or_else(|| ProviderError::Sdk {
            code: None,
            message: "CreateKeyPair returned no key material".to_string(),
        })?;

        let key_pair_id = response.key_pair_id().unwrap_or_default().to_string();
        info!(key_name = %key_name, key_pair_id = %key_pair_id, "Key pair created");

        Ok(CreatedKeyPair {
            key_name: response.key_name().unwrap_or(key_name).to_string(),
            key_pair_id,
            fingerprint: response.key_fingerprint().map(str::to_string),
            key_material: KeyMaterial::new(key_material),
        })
    }

    /// Delete a key pair by name.
    ///
    /// EC2 `DeleteKeyPair` succeeds for names that do not exist, so the key is
    /// looked up first and a missing key surfaces as `InvalidKeyPair.NotFound`.
    pub async fn delete_key_pair(&self, key_name: &str) -> Result<(), ProviderError> {
        info!(key_name = %key_name, "Deleting key pair");

        self.client
            .describe_key_pairs()
            .key_names(key_name)
            .send()
            .await
            .classify()?;

        self.client
            .delete_key_pair()
            .key_name(key_name)
            .send()
            .await
            .classify()?;

        debug!(key_name = %key_name, "Key pair deleted");
        Ok(())
    }

    /// List key pairs in the region
    pub async fn list_key_pairs(&self) -> Result<Vec<KeyPairSummary>, ProviderError> {
        let response = self.client.describe_key_pairs().send().await.classify()?;

        Ok(response
            .key_pairs()
            .iter()
            .filter_map(|kp| {
                Some(KeyPairSummary {
                    key_name: kp.key_name()?.to_string(),
                    key_pair_id: kp.key_pair_id().unwrap_or_default().to_string(),
                    fingerprint: kp.key_fingerprint().map(str::to_string),
                    key_type: kp.key_type().map(|t| t.as_str().to_string()),
                })
            })
            .collect())
    }
}
