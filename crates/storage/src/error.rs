//! Error types for storage and sync operations.

use siteship_common::PathError;
use thiserror::Error;

/// Errors returned by remote service capabilities.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// Bucket, object or other remote resource not found.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Access denied.
    #[error("Access denied to {resource}: {message}")]
    AccessDenied { resource: String, message: String },

    /// Network or service error.
    #[error("Network error: {message}")]
    NetworkError { message: String, retryable: bool },

    /// Local I/O error.
    #[error("I/O error for {path}: {message}")]
    IoError { path: String, message: String },

    /// The call did not complete within the local timeout.
    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl StorageError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::NetworkError { retryable, .. } => *retryable,
            StorageError::Timeout { .. } => true,
            StorageError::NotFound { .. }
            | StorageError::AccessDenied { .. }
            | StorageError::IoError { .. }
            | StorageError::InvalidConfig { .. }
            | StorageError::Other { .. } => false,
        }
    }
}

/// Non-fatal error for a single file during sync.
#[derive(Error, Debug, Clone)]
pub enum FileError {
    /// The local file could not be read while fingerprinting it,
    /// e.g. it was deleted after the walk.
    #[error("Failed to fingerprint {key}: {message}")]
    Hash { key: String, message: String },

    /// The entry could not be read during the directory walk, so its
    /// contents (or a whole subtree) were never considered.
    /// `key` is the entry's relative path, or its absolute path when no
    /// valid key could be derived.
    #[error("Failed to read {key}: {message}")]
    Walk { key: String, message: String },

    /// The upload failed or timed out.
    #[error("Failed to upload {key}: {source}")]
    Transfer {
        key: String,
        #[source]
        source: StorageError,
    },
}

impl FileError {
    /// The object key of the file that failed.
    pub fn key(&self) -> &str {
        match self {
            FileError::Hash { key, .. }
            | FileError::Walk { key, .. }
            | FileError::Transfer { key, .. } => key,
        }
    }
}

/// Fatal errors that abort a sync.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The local root does not exist, is not a directory or is unreadable.
    /// Raised before any remote call.
    #[error(transparent)]
    Path(#[from] PathError),

    /// The remote listing failed, so there is no baseline to compare against.
    #[error("Failed to list objects in bucket {bucket}: {source}")]
    Listing {
        bucket: String,
        #[source]
        source: StorageError,
    },

    /// Every file that needed attention failed.
    #[error("All {} files failed to sync", .failures.len())]
    AllFilesFailed { failures: Vec<FileError> },
}

/// Errors from bucket, domain and CDN setup workflows.
#[derive(Error, Debug)]
pub enum SiteError {
    /// A remote capability call failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The region has no known static website endpoint.
    #[error("No website endpoint known for region {region}")]
    UnknownRegion { region: String },

    /// No issued certificate covers the domain.
    #[error("No matching certificate found for {domain}")]
    NoCertificate { domain: String },
}
