//! Sync orchestration: decide which local files must be uploaded.
//!
//! A sync takes one snapshot of the destination bucket's fingerprints, walks
//! the local tree, fingerprints every file the way the store computes ETags
//! and uploads only files whose fingerprint differs from the snapshot.
//!
//! - Unchanged files are skipped, so re-running on an unchanged tree uploads
//!   nothing.
//! - Per-file work runs concurrently; the snapshot is shared read-only and
//!   every file maps to a distinct key.
//! - A failure for one file is recorded and the remaining files still run.
//!
//! # Example
//!
//! ```ignore
//! use siteship_storage::{SyncOptions, SyncPlanner};
//!
//! let planner = SyncPlanner::new(&store).with_options(SyncOptions::default());
//! let report = planner.sync(Path::new("./site"), "www.example.com").await?;
//! println!("{:?}: {} uploaded", report.outcome(), report.uploaded.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use siteship_common::{fingerprint_file, Fingerprint, ProgressCallback, CHUNK_SIZE};
use siteship_filesystem::{resolve_root, FileEntry, FileSystemScanner, ScanOptions, ScanResult};

use crate::content_type::content_type_for_key;
use crate::error::{FileError, StorageError, SyncError};
use crate::manifest_cache::{ManifestCache, RemoteManifest};
use crate::traits::ObjectStore;
use crate::types::{SyncOutcome, SyncPhase, SyncProgress, SyncReport};

/// Default number of files processed concurrently.
pub const DEFAULT_SYNC_CONCURRENCY: usize = 10;

/// Default timeout for one listing page request.
pub const DEFAULT_LISTING_TIMEOUT: Duration = Duration::from_secs(300);

/// Default timeout for one file upload.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(3600);

/// Options for sync operations.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum files fingerprinted/uploaded at once.
    pub max_concurrency: usize,
    /// Fingerprint chunk size. Must equal the store's multipart part size.
    pub chunk_size: u64,
    /// Whether to follow symlinks while walking the local tree.
    pub follow_symlinks: bool,
    /// Timeout per listing page. `None` disables it.
    pub listing_timeout: Option<Duration>,
    /// Timeout per file upload. `None` disables it.
    pub transfer_timeout: Option<Duration>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_SYNC_CONCURRENCY,
            chunk_size: CHUNK_SIZE,
            follow_symlinks: true,
            listing_timeout: Some(DEFAULT_LISTING_TIMEOUT),
            transfer_timeout: Some(DEFAULT_TRANSFER_TIMEOUT),
        }
    }
}

impl SyncOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum concurrency.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Set the fingerprint chunk size.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set whether symlinks are followed.
    pub fn with_follow_symlinks(mut self, follow_symlinks: bool) -> Self {
        self.follow_symlinks = follow_symlinks;
        self
    }

    /// Set the listing timeout.
    pub fn with_listing_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.listing_timeout = timeout;
        self
    }

    /// Set the per-file transfer timeout.
    pub fn with_transfer_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.transfer_timeout = timeout;
        self
    }
}

/// Why a file is being uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadReason {
    /// The key is not in the remote manifest.
    New,
    /// The local fingerprint differs from the remote one.
    Changed,
    /// The file is empty and has no fingerprint to compare.
    NoFingerprint,
}

/// What to do with one local file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// Remote content is identical.
    Skip,
    /// Upload the file.
    Upload(UploadReason),
}

/// Decide whether a file must be uploaded.
///
/// # Arguments
/// * `key` - Object key of the file
/// * `local` - Local fingerprint, `None` for an empty file
/// * `manifest` - Remote snapshot
pub fn decide(key: &str, local: Option<&Fingerprint>, manifest: &RemoteManifest) -> SyncDecision {
    let Some(local) = local else {
        return SyncDecision::Upload(UploadReason::NoFingerprint);
    };

    match manifest.get(key) {
        None => SyncDecision::Upload(UploadReason::New),
        Some(remote) if remote == local => SyncDecision::Skip,
        Some(_) => SyncDecision::Upload(UploadReason::Changed),
    }
}

/// Result of processing one file.
#[derive(Debug)]
enum FileResult {
    Uploaded { key: String, size: u64 },
    Skipped { key: String, size: u64 },
    Failed(FileError),
}

/// Shared counters for progress reporting.
struct ProgressTracker {
    total_files: u64,
    files_completed: AtomicU64,
    bytes_uploaded: AtomicU64,
}

/// Uploads the changed files of a local tree to a bucket.
pub struct SyncPlanner<'a, S: ObjectStore + ?Sized> {
    /// The object store.
    store: &'a S,
    /// Sync options.
    options: SyncOptions,
    /// Optional progress callback.
    progress: Option<&'a dyn ProgressCallback<SyncProgress>>,
}

impl<'a, S: ObjectStore + ?Sized> SyncPlanner<'a, S> {
    /// Create a new planner with default options.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            options: SyncOptions::default(),
            progress: None,
        }
    }

    /// Set sync options.
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Set a progress callback.
    pub fn with_progress(mut self, progress: &'a dyn ProgressCallback<SyncProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sync every regular file under `local_root` to `bucket`.
    ///
    /// # Returns
    /// A report of uploaded, skipped and failed keys. `report.outcome()`
    /// distinguishes full from partial success.
    ///
    /// # Errors
    /// - `SyncError::Path` if `local_root` is unusable (before any remote call)
    /// - `SyncError::Listing` if the remote manifest cannot be loaded
    /// - `SyncError::AllFilesFailed` if every file failed
    ///
    /// Entries the scan could not read are reported as `FileError::Walk`
    /// failures, so a sync that missed part of the tree is never a
    /// `SyncOutcome::Success`.
    pub async fn sync(&self, local_root: &Path, bucket: &str) -> Result<SyncReport, SyncError> {
        let root: PathBuf = resolve_root(local_root)?;

        self.report_phase(SyncPhase::Listing, 0, 0, 0);
        let mut cache = ManifestCache::new(self.store).with_listing_timeout(self.options.listing_timeout);
        cache.load(bucket).await?;
        let manifest: RemoteManifest = cache.into_manifest();

        self.report_phase(SyncPhase::Scanning, 0, 0, 0);
        let scanner = FileSystemScanner::new(ScanOptions {
            follow_symlinks: self.options.follow_symlinks,
        });
        let ScanResult { files, errors } = scanner.scan(&root)?;

        // Unreadable entries count as already-finished failures.
        let tracker = ProgressTracker {
            total_files: (files.len() + errors.len()) as u64,
            files_completed: AtomicU64::new(errors.len() as u64),
            bytes_uploaded: AtomicU64::new(0),
        };
        self.report_phase(SyncPhase::Syncing, 0, tracker.total_files, 0);

        let max_concurrency: usize = self.options.max_concurrency.max(1);
        let results: Vec<FileResult> = stream::iter(files)
            .map(|entry| self.process_entry(entry, &manifest, bucket, &tracker))
            .buffer_unordered(max_concurrency)
            .collect()
            .await;

        let mut report = SyncReport::default();
        for error in errors {
            report.record_failure(FileError::Walk {
                key: error
                    .key
                    .unwrap_or_else(|| error.path.display().to_string()),
                message: error.message,
            });
        }
        for result in results {
            match result {
                FileResult::Uploaded { key, size } => report.record_uploaded(key, size),
                FileResult::Skipped { key, size } => report.record_skipped(key, size),
                FileResult::Failed(error) => report.record_failure(error),
            }
        }
        report.sort();

        log::info!(
            "Sync of {} to {} finished: {} uploaded, {} skipped, {} failed",
            root.display(),
            bucket,
            report.uploaded.len(),
            report.skipped.len(),
            report.failures.len()
        );
        self.report_phase(
            SyncPhase::Complete,
            report.files_processed() as u64,
            tracker.total_files,
            report.bytes_uploaded,
        );

        if report.outcome() == SyncOutcome::Failure {
            return Err(SyncError::AllFilesFailed {
                failures: report.failures,
            });
        }

        Ok(report)
    }

    /// Fingerprint, compare and, if needed, upload one file.
    async fn process_entry(
        &self,
        entry: FileEntry,
        manifest: &RemoteManifest,
        bucket: &str,
        tracker: &ProgressTracker,
    ) -> FileResult {
        let result: FileResult = self.sync_entry(entry, manifest, bucket).await;

        let completed: u64 = tracker.files_completed.fetch_add(1, Ordering::Relaxed) + 1;
        let (key, uploaded_bytes): (String, u64) = match &result {
            FileResult::Uploaded { key, size } => (key.clone(), *size),
            FileResult::Skipped { key, .. } => (key.clone(), 0),
            FileResult::Failed(error) => (error.key().to_string(), 0),
        };
        let bytes: u64 = tracker.bytes_uploaded.fetch_add(uploaded_bytes, Ordering::Relaxed)
            + uploaded_bytes;

        if let Some(cb) = self.progress {
            cb.on_progress(&SyncProgress {
                phase: SyncPhase::Syncing,
                current_key: Some(key),
                files_completed: completed,
                total_files: tracker.total_files,
                bytes_uploaded: bytes,
            });
        }

        result
    }

    async fn sync_entry(
        &self,
        entry: FileEntry,
        manifest: &RemoteManifest,
        bucket: &str,
    ) -> FileResult {
        let local: Option<Fingerprint> = match self.fingerprint_entry(&entry).await {
            Ok(fingerprint) => fingerprint,
            Err(error) => {
                log::warn!("{}", error);
                return FileResult::Failed(error);
            }
        };

        match decide(&entry.key, local.as_ref(), manifest) {
            SyncDecision::Skip => {
                log::debug!("Skipping unchanged {}", entry.key);
                FileResult::Skipped {
                    key: entry.key,
                    size: entry.size,
                }
            }
            SyncDecision::Upload(reason) => {
                log::debug!("Uploading {} ({:?})", entry.key, reason);
                match self.upload_entry(&entry, bucket).await {
                    Ok(()) => FileResult::Uploaded {
                        key: entry.key,
                        size: entry.size,
                    },
                    Err(source) => {
                        let error = FileError::Transfer {
                            key: entry.key,
                            source,
                        };
                        log::warn!("{}", error);
                        FileResult::Failed(error)
                    }
                }
            }
        }
    }

    /// Fingerprint a file on the blocking pool.
    async fn fingerprint_entry(&self, entry: &FileEntry) -> Result<Option<Fingerprint>, FileError> {
        let path: PathBuf = entry.absolute_path.clone();
        let chunk_size: u64 = self.options.chunk_size;

        let joined = tokio::task::spawn_blocking(move || fingerprint_file(&path, chunk_size)).await;

        match joined {
            Ok(Ok(fingerprint)) => Ok(fingerprint),
            Ok(Err(e)) => Err(FileError::Hash {
                key: entry.key.clone(),
                message: e.to_string(),
            }),
            Err(e) => Err(FileError::Hash {
                key: entry.key.clone(),
                message: e.to_string(),
            }),
        }
    }

    async fn upload_entry(&self, entry: &FileEntry, bucket: &str) -> Result<(), StorageError> {
        let content_type: String = content_type_for_key(&entry.key);
        let request = self
            .store
            .upload_file(bucket, &entry.key, &entry.absolute_path, &content_type);

        match self.options.transfer_timeout {
            Some(timeout) => tokio::time::timeout(timeout, request)
                .await
                .map_err(|_| StorageError::Timeout {
                    operation: format!("Upload of {}", entry.key),
                    seconds: timeout.as_secs(),
                })?,
            None => request.await,
        }
    }

    fn report_phase(&self, phase: SyncPhase, files_completed: u64, total_files: u64, bytes: u64) {
        if let Some(cb) = self.progress {
            cb.on_progress(&SyncProgress {
                phase,
                current_key: None,
                files_completed,
                total_files,
                bytes_uploaded: bytes,
            });
        }
    }
}
