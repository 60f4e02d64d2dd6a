//! CloudFront distributions and ACM certificates.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_acm::config::Region;
use aws_sdk_acm::types::CertificateStatus;
use aws_sdk_acm::Client as AcmClient;
use aws_sdk_cloudfront::client::Waiters;
use aws_sdk_cloudfront::types::{
    Aliases, CookiePreference, DefaultCacheBehavior, DistributionConfig, ForwardedValues, Headers,
    ItemSelection, MinimumProtocolVersion, Origin, Origins, S3OriginConfig, SslSupportMethod,
    TrustedSigners, ViewerCertificate, ViewerProtocolPolicy,
};
use aws_sdk_cloudfront::Client as CloudFrontClient;
use siteship_storage::{certificate_covers, CdnService, Certificate, Distribution, StorageError};
use uuid::Uuid;

use crate::error::{sdk_error, AwsError};

/// CloudFront only accepts ACM certificates from this region.
const CERTIFICATE_REGION: &str = "us-east-1";

/// Longest time to wait for a distribution to deploy.
const DEPLOY_TIMEOUT: Duration = Duration::from_secs(35 * 60);

/// Seconds an object stays cached when the origin sends no cache headers.
const DEFAULT_TTL: i64 = 86_400;

/// Minimum seconds an object stays cached.
const MIN_TTL: i64 = 3_600;

/// `CdnService` implementation on CloudFront, with certificates from ACM.
#[derive(Debug, Clone)]
pub struct CloudFrontCdn {
    cloudfront: CloudFrontClient,
    acm: AcmClient,
}

impl CloudFrontCdn {
    /// Create a CDN service from a loaded SDK configuration.
    ///
    /// The ACM client is pinned to `us-east-1`, the only region whose
    /// certificates CloudFront accepts.
    pub fn new(sdk_config: &SdkConfig) -> Self {
        let acm_config = aws_sdk_acm::config::Builder::from(sdk_config)
            .region(Region::new(CERTIFICATE_REGION))
            .build();

        Self {
            cloudfront: CloudFrontClient::new(sdk_config),
            acm: AcmClient::from_conf(acm_config),
        }
    }

    /// Create a CDN service from existing clients (for testing).
    ///
    /// `acm` must already target the certificate region.
    pub fn from_clients(cloudfront: CloudFrontClient, acm: AcmClient) -> Self {
        Self { cloudfront, acm }
    }
}

/// Distribution serving the website bucket named `domain` over HTTPS.
fn distribution_config(
    domain: &str,
    certificate: &Certificate,
) -> Result<DistributionConfig, AwsError> {
    let origin_id = format!("S3-{}", domain);

    let origin = Origin::builder()
        .id(&origin_id)
        .domain_name(format!("{}.s3.amazonaws.com", domain))
        .s3_origin_config(
            S3OriginConfig::builder()
                .origin_access_identity("")
                .build(),
        )
        .build()?;

    let forwarded_values = ForwardedValues::builder()
        .query_string(false)
        .cookies(
            CookiePreference::builder()
                .forward(ItemSelection::from("all"))
                .build()?,
        )
        .headers(Headers::builder().quantity(0).build()?)
        .build()?;

    let cache_behavior = DefaultCacheBehavior::builder()
        .target_origin_id(&origin_id)
        .viewer_protocol_policy(ViewerProtocolPolicy::from("redirect-to-https"))
        .forwarded_values(forwarded_values)
        .trusted_signers(TrustedSigners::builder().enabled(false).quantity(0).build()?)
        .default_ttl(DEFAULT_TTL)
        .min_ttl(MIN_TTL)
        .build()?;

    let viewer_certificate = ViewerCertificate::builder()
        .acm_certificate_arn(&certificate.arn)
        .ssl_support_method(SslSupportMethod::from("sni-only"))
        .minimum_protocol_version(MinimumProtocolVersion::from("TLSv1.2_2021"))
        .build();

    Ok(DistributionConfig::builder()
        .caller_reference(Uuid::new_v4().to_string())
        .aliases(Aliases::builder().quantity(1).items(domain).build()?)
        .default_root_object("index.html")
        .comment(format!("Created by siteship for {}", domain))
        .enabled(true)
        .origins(Origins::builder().quantity(1).items(origin).build()?)
        .default_cache_behavior(cache_behavior)
        .viewer_certificate(viewer_certificate)
        .build()?)
}

#[async_trait]
impl CdnService for CloudFrontCdn {
    async fn find_distribution(&self, domain: &str) -> Result<Option<Distribution>, StorageError> {
        let mut marker: Option<String> = None;

        loop {
            let mut request = self.cloudfront.list_distributions();
            if let Some(ref m) = marker {
                request = request.marker(m);
            }

            let response = request
                .send()
                .await
                .map_err(|err| sdk_error(domain, err))?;

            let Some(list) = response.distribution_list() else {
                return Ok(None);
            };

            for summary in list.items() {
                let aliases: Vec<String> = summary
                    .aliases()
                    .map(|a| a.items().to_vec())
                    .unwrap_or_default();

                if aliases.iter().any(|alias| alias == domain) {
                    return Ok(Some(Distribution {
                        id: summary.id().to_string(),
                        domain_name: summary.domain_name().to_string(),
                        aliases,
                    }));
                }
            }

            match list.next_marker() {
                Some(next) if list.is_truncated() => marker = Some(next.to_string()),
                _ => return Ok(None),
            }
        }
    }

    async fn find_certificate(&self, domain: &str) -> Result<Option<Certificate>, StorageError> {
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self
                .acm
                .list_certificates()
                .certificate_statuses(CertificateStatus::from("ISSUED"));
            if let Some(ref token) = next_token {
                request = request.next_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|err| sdk_error(domain, err))?;

            for summary in response.certificate_summary_list() {
                let (Some(arn), Some(primary)) = (summary.certificate_arn(), summary.domain_name())
                else {
                    continue;
                };

                let mut names: Vec<String> = vec![primary.to_string()];
                names.extend(
                    summary
                        .subject_alternative_name_summaries()
                        .iter()
                        .cloned(),
                );

                if certificate_covers(domain, names.as_slice()) {
                    return Ok(Some(Certificate {
                        arn: arn.to_string(),
                        domain_name: primary.to_string(),
                        alternative_names: names,
                    }));
                }
            }

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => return Ok(None),
            }
        }
    }

    async fn create_distribution(
        &self,
        domain: &str,
        certificate: &Certificate,
    ) -> Result<Distribution, StorageError> {
        let config = distribution_config(domain, certificate)?;

        let response = self
            .cloudfront
            .create_distribution()
            .distribution_config(config)
            .send()
            .await
            .map_err(|err| sdk_error(domain, err))?;

        let created = response.distribution().ok_or_else(|| StorageError::Other {
            message: format!("No distribution returned for {}", domain),
        })?;

        Ok(Distribution {
            id: created.id().to_string(),
            domain_name: created.domain_name().to_string(),
            aliases: vec![domain.to_string()],
        })
    }

    async fn wait_until_deployed(&self, distribution: &Distribution) -> Result<(), StorageError> {
        self.cloudfront
            .wait_until_distribution_deployed()
            .id(&distribution.id)
            .wait(DEPLOY_TIMEOUT)
            .await
            .map_err(|err| StorageError::NetworkError {
                message: format!(
                    "Distribution {} did not deploy: {}",
                    distribution.id, err
                ),
                retryable: true,
            })?;

        log::info!("Distribution {} deployed", distribution.id);
        Ok(())
    }
}
