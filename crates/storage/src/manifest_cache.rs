//! Point-in-time snapshot of remote object fingerprints.
//!
//! One full listing of the destination bucket is taken per sync, before any
//! file decision. The snapshot is never updated as uploads happen and is not
//! persisted across runs.

use std::collections::HashMap;
use std::time::Duration;

use siteship_common::Fingerprint;

use crate::error::{StorageError, SyncError};
use crate::traits::ObjectStore;
use crate::types::{ObjectInfo, ObjectListPage};

/// Mapping from object key to the fingerprint the remote store reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteManifest {
    entries: HashMap<String, Fingerprint>,
}

impl RemoteManifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&Fingerprint> {
        self.entries.get(key)
    }

    /// Record a fingerprint, replacing any previous one for the key.
    pub fn insert(&mut self, key: impl Into<String>, fingerprint: Fingerprint) {
        self.entries.insert(key.into(), fingerprint);
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Fingerprint)> for RemoteManifest {
    fn from_iter<I: IntoIterator<Item = (String, Fingerprint)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Loads and holds the remote manifest for one sync invocation.
pub struct ManifestCache<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    listing_timeout: Option<Duration>,
    manifest: RemoteManifest,
}

impl<'a, S: ObjectStore + ?Sized> ManifestCache<'a, S> {
    /// Create an empty cache over `store`.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            listing_timeout: None,
            manifest: RemoteManifest::new(),
        }
    }

    /// Bound each listing page request by `timeout`.
    pub fn with_listing_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.listing_timeout = timeout;
        self
    }

    /// Replace the held manifest with a full listing of `bucket`.
    ///
    /// Every page is fetched. Objects without an ETag are left out, so the
    /// matching local files will be uploaded. An empty bucket yields an
    /// empty manifest. On failure the previously held manifest is cleared.
    ///
    /// # Errors
    /// `SyncError::Listing` if any page fails or times out.
    pub async fn load(&mut self, bucket: &str) -> Result<&RemoteManifest, SyncError> {
        self.manifest = RemoteManifest::new();

        let objects: Vec<ObjectInfo> = list_all_objects(self.store, bucket, self.listing_timeout)
            .await
            .map_err(|source| SyncError::Listing {
                bucket: bucket.to_string(),
                source,
            })?;

        let mut entries: HashMap<String, Fingerprint> = HashMap::with_capacity(objects.len());
        for ObjectInfo { key, etag, .. } in objects {
            match etag {
                Some(etag) => {
                    entries.insert(key, Fingerprint::from_etag(etag));
                }
                None => log::debug!("Object {} has no ETag, treating as unknown", key),
            }
        }

        log::debug!("Loaded {} remote fingerprints from {}", entries.len(), bucket);

        self.manifest = RemoteManifest { entries };
        Ok(&self.manifest)
    }

    /// The manifest from the last successful `load`.
    pub fn manifest(&self) -> &RemoteManifest {
        &self.manifest
    }

    /// Take ownership of the held manifest.
    pub fn into_manifest(self) -> RemoteManifest {
        self.manifest
    }
}

/// List every object in `bucket`, following continuation tokens to the end.
///
/// Each page request is bounded by `page_timeout` when one is given.
/// Objects come back in the order the store returns them.
///
/// # Errors
/// The first page failure, or `StorageError::Timeout` if a page times out.
pub async fn list_all_objects<S: ObjectStore + ?Sized>(
    store: &S,
    bucket: &str,
    page_timeout: Option<Duration>,
) -> Result<Vec<ObjectInfo>, StorageError> {
    let mut objects: Vec<ObjectInfo> = Vec::new();
    let mut continuation_token: Option<String> = None;
    let mut pages: usize = 0;

    loop {
        let page: ObjectListPage =
            fetch_page(store, bucket, continuation_token.as_deref(), page_timeout).await?;
        pages += 1;
        objects.extend(page.objects);

        match page.next_continuation_token {
            Some(token) => continuation_token = Some(token),
            None => break,
        }
    }

    log::debug!("Listed {} objects in {} in {} page(s)", objects.len(), bucket, pages);
    Ok(objects)
}

async fn fetch_page<S: ObjectStore + ?Sized>(
    store: &S,
    bucket: &str,
    continuation_token: Option<&str>,
    page_timeout: Option<Duration>,
) -> Result<ObjectListPage, StorageError> {
    let request = store.list_objects_page(bucket, continuation_token);
    match page_timeout {
        Some(timeout) => tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| StorageError::Timeout {
                operation: format!("Listing bucket {}", bucket),
                seconds: timeout.as_secs(),
            })?,
        None => request.await,
    }
}
