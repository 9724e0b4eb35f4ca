//! Provider configuration
//!
//! Settings come from a `provider` block in the configuration file and from
//! command-line flags (which fall back to environment variables). Anything
//! left unset is resolved by the AWS SDK's default chain.

use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation;

/// Attempts per API call, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 25;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0}")]
    InvalidRegion(String),

    #[error("account_id must be a 12 digit AWS account ID, got {0:?}")]
    InvalidAccountId(String),

    #[error("max_attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("endpoint_url must be an http(s) URL, got {0:?}")]
    InvalidEndpoint(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub region: Option<String>,
    /// Named profile from the shared AWS config files
    pub profile: Option<String>,
    /// Override for the SSM/STS endpoint (e.g. a local emulator)
    pub endpoint_url: Option<String>,
    /// Skips the STS lookup when set
    pub account_id: Option<String>,
    pub max_attempts: Option<u32>,
}

impl ProviderConfig {
    /// Fill unset fields from `other`
    pub fn or(self, other: ProviderConfig) -> ProviderConfig {
        ProviderConfig {
            region: self.region.or(other.region),
            profile: self.profile.or(other.profile),
            endpoint_url: self.endpoint_url.or(other.endpoint_url),
            account_id: self.account_id.or(other.account_id),
            max_attempts: self.max_attempts.or(other.max_attempts),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(region) = &self.region
            && let Some(message) = validation::validate_region(region, "region").pop()
        {
            return Err(ConfigError::InvalidRegion(message));
        }

        if let Some(account_id) = &self.account_id
            && (account_id.len() != 12 || !account_id.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(ConfigError::InvalidAccountId(account_id.clone()));
        }

        if self.max_attempts == Some(0) {
            return Err(ConfigError::InvalidMaxAttempts);
        }

        if let Some(url) = &self.endpoint_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidEndpoint(url.clone()));
        }

        Ok(())
    }

    /// Load the shared SDK configuration these settings describe
    pub async fn load_sdk_config(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(url) = &self.endpoint_url {
            loader = loader.endpoint_url(url);
        }

        let attempts = self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        loader = loader.retry_config(RetryConfig::standard().with_max_attempts(attempts));

        loader.load().await
    }
}
