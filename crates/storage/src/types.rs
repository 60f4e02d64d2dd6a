//! Shared data structures for storage and sync operations.

use serde::{Deserialize, Serialize};
use siteship_common::CHUNK_SIZE;

use crate::error::FileError;

/// Configuration for building remote service clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Region override. `None` uses the default provider chain.
    pub region: Option<String>,
    /// Named profile from the shared config files.
    pub profile: Option<String>,
    /// Static credentials. `None` uses the default provider chain.
    #[serde(skip)]
    pub credentials: Option<AwsCredentials>,
    /// Multipart part size. Must equal the fingerprint chunk size.
    pub chunk_size: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            region: None,
            profile: None,
            credentials: None,
            chunk_size: CHUNK_SIZE,
        }
    }
}

/// AWS credentials.
#[derive(Debug, Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

/// Static website hosting documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteConfig {
    /// Index document suffix served for directory requests.
    pub index_document: String,
    /// Key served on 4xx errors.
    pub error_document: String,
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            index_document: "index.html".into(),
            error_document: "error.html".into(),
        }
    }
}

/// Information about an object from a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last modified timestamp (Unix epoch seconds).
    pub last_modified: Option<i64>,
    /// ETag exactly as reported, quotes included.
    pub etag: Option<String>,
}

/// One page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListPage {
    /// Objects on this page.
    pub objects: Vec<ObjectInfo>,
    /// Token for the next page, `None` on the last page.
    pub next_continuation_token: Option<String>,
}

/// Result of a bucket creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateBucketOutcome {
    /// A new bucket was created.
    Created,
    /// The bucket already exists and belongs to the caller.
    AlreadyOwned,
}

/// A DNS hosted zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    /// Provider zone ID.
    pub id: String,
    /// Zone name with trailing dot, e.g. `example.com.`.
    pub name: String,
}

/// Target of an alias record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTarget {
    /// Host name the alias resolves to.
    pub dns_name: String,
    /// Hosted zone ID that owns `dns_name`.
    pub hosted_zone_id: String,
}

/// A CDN distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// Provider distribution ID.
    pub id: String,
    /// Host name assigned by the CDN, e.g. `d111111abcdef8.cloudfront.net`.
    pub domain_name: String,
    /// Alternate domain names served by the distribution.
    pub aliases: Vec<String>,
}

/// A TLS certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Provider certificate ARN.
    pub arn: String,
    /// Primary domain name.
    pub domain_name: String,
    /// Subject alternative names, including the primary name.
    pub alternative_names: Vec<String>,
}

/// How a sync finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Every file was uploaded or skipped.
    Success,
    /// Some files failed, others were uploaded or skipped.
    PartialSuccess,
    /// Every file failed.
    Failure,
}

/// Per-file results of a sync.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Keys that were uploaded.
    pub uploaded: Vec<String>,
    /// Keys whose fingerprint matched the remote one.
    pub skipped: Vec<String>,
    /// Files that failed to fingerprint or upload.
    pub failures: Vec<FileError>,
    /// Total bytes uploaded.
    pub bytes_uploaded: u64,
    /// Total bytes skipped.
    pub bytes_skipped: u64,
}

impl SyncReport {
    /// Total files processed.
    pub fn files_processed(&self) -> usize {
        self.uploaded.len() + self.skipped.len() + self.failures.len()
    }

    /// Classify the result.
    ///
    /// An empty tree counts as success.
    pub fn outcome(&self) -> SyncOutcome {
        if self.failures.is_empty() {
            SyncOutcome::Success
        } else if self.uploaded.is_empty() && self.skipped.is_empty() {
            SyncOutcome::Failure
        } else {
            SyncOutcome::PartialSuccess
        }
    }

    /// Record an uploaded file.
    pub fn record_uploaded(&mut self, key: String, size: u64) {
        self.uploaded.push(key);
        self.bytes_uploaded += size;
    }

    /// Record a skipped file.
    pub fn record_skipped(&mut self, key: String, size: u64) {
        self.skipped.push(key);
        self.bytes_skipped += size;
    }

    /// Record a failed file.
    pub fn record_failure(&mut self, error: FileError) {
        self.failures.push(error);
    }

    /// Sort every list by key so reports compare independent of completion order.
    pub fn sort(&mut self) {
        self.uploaded.sort();
        self.skipped.sort();
        self.failures.sort_by(|a, b| a.key().cmp(b.key()));
    }
}

/// Progress update for sync operations.
#[derive(Debug, Clone)]
pub struct SyncProgress {
    /// Current phase.
    pub phase: SyncPhase,
    /// Key of the file that just completed, if any.
    pub current_key: Option<String>,
    /// Files completed so far.
    pub files_completed: u64,
    /// Total files found (0 until scanning finishes).
    pub total_files: u64,
    /// Bytes uploaded so far.
    pub bytes_uploaded: u64,
}

/// Phase of a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Loading the remote manifest.
    Listing,
    /// Walking the local tree.
    Scanning,
    /// Fingerprinting and uploading files.
    Syncing,
    /// Done.
    Complete,
}
