//! Exporter configuration
//!
//! Everything comes from the environment: `AWS_*` for the provider and
//! `EXPORTER_*` for the exporter itself. Empty variables count as unset.

use anyhow::Result;
use exporter_lib::aws::AwsSettings;
use exporter_lib::poller::DEFAULT_POLL_INTERVAL;
use exporter_lib::server::DEFAULT_LISTEN_PORT;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Exporter settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ExporterSettings {
    /// Port for the scrape endpoint
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Seconds between poll cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_listen_port() -> u16 {
    DEFAULT_LISTEN_PORT
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

impl ExporterSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub exporter: ExporterSettings,
    pub aws: AwsSettings,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from an explicit variable map instead of the process environment
    fn load_from(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let exporter = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("EXPORTER")
                    .try_parsing(true)
                    .ignore_empty(true)
                    .source(vars.clone()),
            )
            .build()?
            .try_deserialize::<ExporterSettings>()?;

        if exporter.poll_interval_secs == 0 {
            anyhow::bail!("EXPORTER_POLL_INTERVAL_SECS must be greater than zero");
        }

        let aws = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("AWS")
                    .ignore_empty(true)
                    .source(vars),
            )
            .build()?
            .try_deserialize::<AwsSettings>()?;

        Ok(Self { exporter, aws })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::load_from(vars(&[])).unwrap();

        assert_eq!(config.exporter.listen_port, 9761);
        assert_eq!(config.exporter.poll_interval(), Duration::from_secs(300));
        assert_eq!(config.aws.region, "us-east-1");
        assert!(config.aws.static_credentials().is_none());
    }

    #[test]
    fn test_aws_variables() {
        let config = AppConfig::load_from(vars(&[
            ("AWS_REGION", "eu-central-1"),
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_SESSION_TOKEN", "token"),
        ]))
        .unwrap();

        assert_eq!(config.aws.region, "eu-central-1");
        let credentials = config.aws.static_credentials().unwrap();
        assert_eq!(credentials.access_key_id(), "AKIDEXAMPLE");
        assert_eq!(credentials.session_token(), Some("token"));
    }

    #[test]
    fn test_empty_region_falls_back_to_default() {
        let config = AppConfig::load_from(vars(&[("AWS_REGION", "")])).unwrap();

        assert_eq!(config.aws.region, "us-east-1");
    }

    #[test]
    fn test_exporter_overrides() {
        let config = AppConfig::load_from(vars(&[
            ("EXPORTER_LISTEN_PORT", "9100"),
            ("EXPORTER_POLL_INTERVAL_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.exporter.listen_port, 9100);
        assert_eq!(config.exporter.poll_interval_secs, 60);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(AppConfig::load_from(vars(&[("EXPORTER_LISTEN_PORT", "not-a-port")])).is_err());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        assert!(AppConfig::load_from(vars(&[("EXPORTER_POLL_INTERVAL_SECS", "0")])).is_err());
    }
}
