//! Route 53 DNS service.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_route53::types::{
    AliasTarget as RecordAliasTarget, Change, ChangeAction, ChangeBatch, ResourceRecordSet, RrType,
};
use aws_sdk_route53::Client as Route53Client;
use siteship_storage::{
    apex_zone_name, zone_matches_domain, AliasTarget, DnsService, HostedZone, StorageError,
};
use uuid::Uuid;

use crate::error::{sdk_error, AwsError};

/// `DnsService` implementation on Route 53.
#[derive(Debug, Clone)]
pub struct Route53Dns {
    client: Route53Client,
}

impl Route53Dns {
    /// Create a DNS service from a loaded SDK configuration.
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Route53Client::new(sdk_config),
        }
    }

    /// Create a DNS service from an existing Route53Client (for testing).
    pub fn from_client(client: Route53Client) -> Self {
        Self { client }
    }
}

/// Build an UPSERT of an A alias record.
fn alias_change_batch(domain: &str, target: &AliasTarget) -> Result<ChangeBatch, AwsError> {
    let alias = RecordAliasTarget::builder()
        .hosted_zone_id(&target.hosted_zone_id)
        .dns_name(&target.dns_name)
        .evaluate_target_health(false)
        .build()?;

    let record = ResourceRecordSet::builder()
        .name(domain)
        .r#type(RrType::A)
        .alias_target(alias)
        .build()?;

    let change = Change::builder()
        .action(ChangeAction::Upsert)
        .resource_record_set(record)
        .build()?;

    Ok(ChangeBatch::builder()
        .comment(format!("Alias {} to {}", domain, target.dns_name))
        .changes(change)
        .build()?)
}

#[async_trait]
impl DnsService for Route53Dns {
    async fn find_hosted_zone(&self, domain: &str) -> Result<Option<HostedZone>, StorageError> {
        let mut marker: Option<String> = None;

        loop {
            let mut request = self.client.list_hosted_zones();
            if let Some(ref m) = marker {
                request = request.marker(m);
            }

            let response = request
                .send()
                .await
                .map_err(|err| sdk_error(domain, err))?;

            let found = response
                .hosted_zones()
                .iter()
                .find(|zone| zone_matches_domain(domain, zone.name()));
            if let Some(zone) = found {
                return Ok(Some(HostedZone {
                    id: zone.id().to_string(),
                    name: zone.name().to_string(),
                }));
            }

            match response.next_marker() {
                Some(next) if response.is_truncated() => marker = Some(next.to_string()),
                _ => return Ok(None),
            }
        }
    }

    async fn create_hosted_zone(&self, domain: &str) -> Result<HostedZone, StorageError> {
        let name = apex_zone_name(domain);

        let response = self
            .client
            .create_hosted_zone()
            .name(&name)
            .caller_reference(Uuid::new_v4().to_string())
            .send()
            .await
            .map_err(|err| sdk_error(&name, err))?;

        let zone = response.hosted_zone().ok_or_else(|| StorageError::Other {
            message: format!("No hosted zone returned for {}", name),
        })?;

        log::info!("Created hosted zone {} ({})", zone.name(), zone.id());
        Ok(HostedZone {
            id: zone.id().to_string(),
            name: zone.name().to_string(),
        })
    }

    async fn upsert_alias_record(
        &self,
        zone: &HostedZone,
        domain: &str,
        target: &AliasTarget,
    ) -> Result<(), StorageError> {
        let batch = alias_change_batch(domain, target)?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(&zone.id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|err| sdk_error(&zone.id, err))?;

        Ok(())
    }
}
