//! Bucket, domain and CDN setup workflows.
//!
//! Each workflow composes capability calls; they hold no state beyond the
//! context they are given.

use crate::error::SiteError;
use crate::traits::{CdnService, DnsService, ObjectStore};
use crate::types::{AliasTarget, CreateBucketOutcome, Distribution, HostedZone, WebsiteConfig};
use crate::website::{website_endpoint, website_url, CLOUDFRONT_HOSTED_ZONE_ID};

/// Remote services and settings for publishing a site.
pub struct DeployContext<'a> {
    store: &'a dyn ObjectStore,
    dns: &'a dyn DnsService,
    cdn: &'a dyn CdnService,
    /// Region new buckets are created in.
    region: String,
    website: WebsiteConfig,
}

impl<'a> DeployContext<'a> {
    /// Compose the three capabilities for sites hosted in `region`.
    ///
    /// Buckets are created in `region`. The website documents default to
    /// `index.html` and `error.html`.
    pub fn new(
        store: &'a dyn ObjectStore,
        dns: &'a dyn DnsService,
        cdn: &'a dyn CdnService,
        region: impl Into<String>,
    ) -> Self {
        Self {
            store,
            dns,
            cdn,
            region: region.into(),
            website: WebsiteConfig::default(),
        }
    }

    /// Override the index and error documents.
    pub fn with_website(mut self, website: WebsiteConfig) -> Self {
        self.website = website;
        self
    }

    /// Create a bucket and publish it as a static website.
    ///
    /// A bucket the caller already owns is reused.
    pub async fn setup_bucket(&self, bucket: &str) -> Result<CreateBucketOutcome, SiteError> {
        let outcome = self.store.create_bucket(bucket, &self.region).await?;
        if outcome == CreateBucketOutcome::AlreadyOwned {
            log::info!("Bucket {} already exists, reusing it", bucket);
        }

        self.store.set_public_read_policy(bucket).await?;
        self.store
            .configure_website(
                bucket,
                &self.website.index_document,
                &self.website.error_document,
            )
            .await?;

        log::info!("Bucket {} configured for website hosting", bucket);
        Ok(outcome)
    }

    /// Website URL of an existing bucket.
    pub async fn bucket_url(&self, bucket: &str) -> Result<String, SiteError> {
        let region = self.store.bucket_region(bucket).await?;
        website_url(bucket, &region).ok_or(SiteError::UnknownRegion { region })
    }

    /// Point `domain` at the website bucket of the same name.
    ///
    /// Returns `http://<domain>`.
    pub async fn setup_domain(&self, domain: &str) -> Result<String, SiteError> {
        let region = self.store.bucket_region(domain).await?;
        let endpoint = website_endpoint(&region).ok_or(SiteError::UnknownRegion { region })?;

        let zone = self.find_or_create_zone(domain).await?;
        let target = AliasTarget {
            dns_name: endpoint.host.to_string(),
            hosted_zone_id: endpoint.zone_id.to_string(),
        };
        self.dns.upsert_alias_record(&zone, domain, &target).await?;

        log::info!("Domain {} now aliases {}", domain, endpoint.host);
        Ok(format!("http://{}", domain))
    }

    /// Serve `domain` over HTTPS through a CDN distribution.
    ///
    /// Returns `https://<domain>`.
    pub async fn setup_cdn(&self, domain: &str) -> Result<String, SiteError> {
        let distribution = match self.cdn.find_distribution(domain).await? {
            Some(distribution) => {
                log::info!("Reusing distribution {} for {}", distribution.id, domain);
                distribution
            }
            None => self.create_distribution(domain).await?,
        };

        let zone = self.find_or_create_zone(domain).await?;
        let target = AliasTarget {
            dns_name: distribution.domain_name.clone(),
            hosted_zone_id: CLOUDFRONT_HOSTED_ZONE_ID.to_string(),
        };
        self.dns.upsert_alias_record(&zone, domain, &target).await?;

        log::info!("Domain {} now aliases {}", domain, distribution.domain_name);
        Ok(format!("https://{}", domain))
    }

    async fn create_distribution(&self, domain: &str) -> Result<Distribution, SiteError> {
        let certificate = self
            .cdn
            .find_certificate(domain)
            .await?
            .ok_or_else(|| SiteError::NoCertificate {
                domain: domain.to_string(),
            })?;

        let distribution = self.cdn.create_distribution(domain, &certificate).await?;
        log::info!(
            "Created distribution {}, waiting for deployment",
            distribution.id
        );
        self.cdn.wait_until_deployed(&distribution).await?;
        Ok(distribution)
    }

    async fn find_or_create_zone(&self, domain: &str) -> Result<HostedZone, SiteError> {
        if let Some(zone) = self.dns.find_hosted_zone(domain).await? {
            return Ok(zone);
        }
        log::info!("No hosted zone for {}, creating one", domain);
        Ok(self.dns.create_hosted_zone(domain).await?)
    }
}
