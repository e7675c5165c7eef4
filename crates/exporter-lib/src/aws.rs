//! Provider client context
//!
//! Region and credentials are resolved once at startup and the resulting
//! `SdkConfig` is shared by both fetchers for the life of the process.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_REGION: &str = "us-east-1";

const STATIC_PROVIDER_NAME: &str = "environment-static";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no credentials provider could be configured")]
    MissingCredentials,
    #[error("unable to resolve credentials: {0}")]
    Credentials(String),
}

/// Provider settings read from `AWS_*` environment variables
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AwsSettings {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }
}

impl AwsSettings {
    /// Explicit credentials, only when both key id and secret are non-empty
    pub fn static_credentials(&self) -> Option<Credentials> {
        let access_key_id = non_empty(self.access_key_id.as_deref())?;
        let secret_access_key = non_empty(self.secret_access_key.as_deref())?;
        let session_token = non_empty(self.session_token.as_deref()).map(str::to_string);

        Some(Credentials::new(
            access_key_id,
            secret_access_key,
            session_token,
            None,
            STATIC_PROVIDER_NAME,
        ))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Build the shared SDK configuration and verify credentials resolve
pub async fn load_sdk_config(settings: &AwsSettings) -> Result<SdkConfig, ConfigError> {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(settings.region.clone()));

    match settings.static_credentials() {
        Some(credentials) => {
            info!(region = %settings.region, "Using static credentials from environment");
            loader = loader.credentials_provider(credentials);
        }
        None => {
            info!(region = %settings.region, "Using default credential provider chain");
        }
    }

    let sdk_config = loader.load().await;

    let provider = sdk_config
        .credentials_provider()
        .ok_or(ConfigError::MissingCredentials)?;
    provider
        .provide_credentials()
        .await
        .map_err(|e| ConfigError::Credentials(e.to_string()))?;

    Ok(sdk_config)
}
