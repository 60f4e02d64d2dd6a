//! Shared SDK configuration for the AWS backends.

use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use siteship_storage::{StorageError, StorageSettings};

use crate::cloudfront::CloudFrontCdn;
use crate::route53::Route53Dns;
use crate::s3::S3ObjectStore;

/// Region used when neither the settings nor the environment name one.
pub const FALLBACK_REGION: &str = "us-east-1";

/// One loaded SDK configuration from which every backend client is built.
#[derive(Debug, Clone)]
pub struct AwsServices {
    sdk_config: SdkConfig,
    chunk_size: u64,
}

impl AwsServices {
    /// Load configuration from the default provider chain.
    ///
    /// # Arguments
    /// * `settings` - Region, profile and static credential overrides
    ///
    /// # Returns
    /// Services sharing one credential and region resolution.
    pub async fn load(settings: &StorageSettings) -> Result<Self, StorageError> {
        if settings.chunk_size == 0 {
            return Err(StorageError::InvalidConfig {
                message: "chunk_size must be greater than zero".to_string(),
            });
        }

        let mut config_loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(ref profile) = settings.profile {
            config_loader = config_loader.profile_name(profile);
        }

        if let Some(ref region) = settings.region {
            config_loader = config_loader.region(Region::new(region.clone()));
        }

        if let Some(ref creds) = settings.credentials {
            let credentials = Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                "siteship",
            );
            config_loader = config_loader.credentials_provider(credentials);
        }

        let sdk_config = config_loader.load().await;
        log::debug!(
            "Loaded AWS configuration for region {}",
            sdk_config
                .region()
                .map(|r| r.as_ref())
                .unwrap_or(FALLBACK_REGION)
        );

        Ok(Self {
            sdk_config,
            chunk_size: settings.chunk_size,
        })
    }

    /// Build services from an already loaded configuration.
    pub fn from_config(sdk_config: SdkConfig, chunk_size: u64) -> Self {
        Self {
            sdk_config,
            chunk_size,
        }
    }

    /// Region new buckets are created in.
    pub fn region(&self) -> String {
        self.sdk_config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| FALLBACK_REGION.to_string())
    }

    /// S3 object store.
    pub fn object_store(&self) -> S3ObjectStore {
        S3ObjectStore::new(&self.sdk_config, self.chunk_size)
    }

    /// Route 53 DNS service.
    pub fn dns(&self) -> Route53Dns {
        Route53Dns::new(&self.sdk_config)
    }

    /// CloudFront distributions with ACM certificates.
    pub fn cdn(&self) -> CloudFrontCdn {
        CloudFrontCdn::new(&self.sdk_config)
    }
}
