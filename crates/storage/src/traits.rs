//! Capability interfaces for the remote services siteship talks to.
//!
//! Each backend implements these against a concrete provider; the sync
//! engine and site workflows only see the traits.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{
    AliasTarget, Certificate, CreateBucketOutcome, Distribution, HostedZone, ObjectListPage,
};

/// Object store operations (S3 buckets).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Names of every bucket the credentials own.
    async fn list_buckets(&self) -> Result<Vec<String>, StorageError>;

    /// List one page of objects in a bucket.
    ///
    /// Pass `None` for the first page and the returned
    /// `next_continuation_token` for each following page.
    async fn list_objects_page(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ObjectListPage, StorageError>;

    /// Upload a local file to `key`.
    ///
    /// Files larger than the backend's part size must be uploaded in parts of
    /// exactly that size so the resulting ETag matches the local fingerprint.
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        file_path: &Path,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Region the bucket lives in.
    async fn bucket_region(&self, bucket: &str) -> Result<String, StorageError>;

    /// Create a bucket in `region`.
    async fn create_bucket(
        &self,
        bucket: &str,
        region: &str,
    ) -> Result<CreateBucketOutcome, StorageError>;

    /// Allow anonymous `GetObject` on every object in the bucket.
    async fn set_public_read_policy(&self, bucket: &str) -> Result<(), StorageError>;

    /// Enable static website hosting.
    async fn configure_website(
        &self,
        bucket: &str,
        index_document: &str,
        error_document: &str,
    ) -> Result<(), StorageError>;
}

/// DNS operations (Route 53 hosted zones).
#[async_trait]
pub trait DnsService: Send + Sync {
    /// Find the hosted zone that serves `domain`.
    async fn find_hosted_zone(&self, domain: &str) -> Result<Option<HostedZone>, StorageError>;

    /// Create a hosted zone for the apex of `domain`.
    async fn create_hosted_zone(&self, domain: &str) -> Result<HostedZone, StorageError>;

    /// Create or replace an A alias record for `domain` in `zone`.
    async fn upsert_alias_record(
        &self,
        zone: &HostedZone,
        domain: &str,
        target: &AliasTarget,
    ) -> Result<(), StorageError>;
}

/// CDN and certificate operations (CloudFront + ACM).
#[async_trait]
pub trait CdnService: Send + Sync {
    /// Find a distribution whose aliases include `domain`.
    async fn find_distribution(&self, domain: &str) -> Result<Option<Distribution>, StorageError>;

    /// Find an issued certificate covering `domain`.
    async fn find_certificate(&self, domain: &str) -> Result<Option<Certificate>, StorageError>;

    /// Create a distribution serving `domain` with `certificate`.
    async fn create_distribution(
        &self,
        domain: &str,
        certificate: &Certificate,
    ) -> Result<Distribution, StorageError>;

    /// Block until the distribution reports as deployed.
    async fn wait_until_deployed(&self, distribution: &Distribution) -> Result<(), StorageError>;
}
