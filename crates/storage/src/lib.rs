//! Manifest-driven sync engine and static site workflows.
//!
//! This crate uploads a local directory tree to an object store, sending only
//! files whose content differs from what the store already holds. Content is
//! compared through fingerprints computed exactly like the store's ETags, so
//! no extra metadata is stored remotely.
//!
//! Remote services are reached through capability traits:
//!
//! - [`ObjectStore`] - bucket and object listing, uploads and website configuration
//! - [`DnsService`] - hosted zones and alias records
//! - [`CdnService`] - distributions and certificates
//!
//! The `siteship-storage-aws` crate implements them on the AWS SDK.
//!
//! # Sync
//!
//! [`SyncPlanner`] loads a [`RemoteManifest`] once through a
//! [`ManifestCache`], walks the local tree and uploads new or changed files
//! concurrently. Per-file failures are collected in the [`SyncReport`].
//!
//! # Site setup
//!
//! [`DeployContext`] composes the traits into the bucket, domain and CDN
//! setup workflows.

mod chunking;
mod content_type;
mod error;
mod manifest_cache;
mod site;
mod sync;
mod traits;
mod types;
mod website;

pub use chunking::{expected_chunk_count, generate_chunks, needs_chunking, ChunkInfo};
pub use content_type::{content_type_for_key, DEFAULT_CONTENT_TYPE};
pub use error::{FileError, SiteError, StorageError, SyncError};
pub use manifest_cache::{list_all_objects, ManifestCache, RemoteManifest};
pub use site::DeployContext;
pub use sync::{
    decide, SyncDecision, SyncOptions, SyncPlanner, UploadReason, DEFAULT_LISTING_TIMEOUT,
    DEFAULT_SYNC_CONCURRENCY, DEFAULT_TRANSFER_TIMEOUT,
};
pub use traits::{CdnService, DnsService, ObjectStore};
pub use types::{
    AliasTarget, AwsCredentials, Certificate, CreateBucketOutcome, Distribution, HostedZone,
    ObjectInfo, ObjectListPage, StorageSettings, SyncOutcome, SyncPhase, SyncProgress,
    SyncReport, WebsiteConfig,
};
pub use website::{
    apex_zone_name, certificate_covers, public_read_policy, website_endpoint, website_url,
    zone_matches_domain, WebsiteEndpoint, CLOUDFRONT_HOSTED_ZONE_ID,
};
