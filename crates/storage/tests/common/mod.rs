//! In-memory capability mocks shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use siteship_common::fingerprint_bytes;
use siteship_storage::{
    AliasTarget, CdnService, Certificate, CreateBucketOutcome, Distribution, DnsService,
    HostedZone, ObjectInfo, ObjectListPage, ObjectStore, StorageError,
};

/// ETag the store reports for an empty object.
pub const EMPTY_ETAG: &str = "\"d41d8cd98f00b204e9800998ecf8427e\"";

/// A stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub etag: String,
    pub size: u64,
    pub content_type: String,
}

#[derive(Debug, Default)]
struct StoreState {
    /// bucket -> key -> object
    objects: HashMap<String, HashMap<String, StoredObject>>,
    list_calls: usize,
    uploads: Vec<String>,
    buckets: HashMap<String, String>,
    policies: HashMap<String, bool>,
    websites: HashMap<String, (String, String)>,
}

/// Mock object store that computes ETags the way S3 does.
#[derive(Debug, Clone)]
pub struct MockObjectStore {
    state: Arc<Mutex<StoreState>>,
    chunk_size: u64,
    page_size: usize,
    fail_listing: bool,
    failing_keys: HashSet<String>,
    slow_keys: HashSet<String>,
    delete_on_upload: HashMap<String, PathBuf>,
}

impl MockObjectStore {
    pub fn new(chunk_size: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            chunk_size,
            page_size: 1000,
            fail_listing: false,
            failing_keys: HashSet::new(),
            slow_keys: HashSet::new(),
            delete_on_upload: HashMap::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn with_failing_key(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn with_slow_key(mut self, key: &str) -> Self {
        self.slow_keys.insert(key.to_string());
        self
    }

    /// Remove `path` from disk while `key` is being uploaded.
    pub fn with_delete_on_upload(mut self, key: &str, path: &Path) -> Self {
        self.delete_on_upload
            .insert(key.to_string(), path.to_path_buf());
        self
    }

    /// Place an object with a given ETag directly in the store.
    pub fn seed(&self, bucket: &str, key: &str, etag: &str) {
        let mut state = self.state.lock().unwrap();
        state.objects.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                etag: etag.to_string(),
                size: 0,
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    pub fn set_bucket_region(&self, bucket: &str, region: &str) {
        let mut state = self.state.lock().unwrap();
        state.buckets.insert(bucket.to_string(), region.to_string());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        let state = self.state.lock().unwrap();
        state.objects.get(bucket).and_then(|b| b.get(key)).cloned()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut keys: Vec<String> = state
            .objects
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    /// Keys passed to `upload_file`, successful or not, sorted.
    pub fn uploads(&self) -> Vec<String> {
        let mut uploads = self.state.lock().unwrap().uploads.clone();
        uploads.sort();
        uploads
    }

    pub fn has_public_policy(&self, bucket: &str) -> bool {
        self.state.lock().unwrap().policies.contains_key(bucket)
    }

    pub fn website(&self, bucket: &str) -> Option<(String, String)> {
        self.state.lock().unwrap().websites.get(bucket).cloned()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn list_buckets(&self) -> Result<Vec<String>, StorageError> {
        let state = self.state.lock().unwrap();
        let mut names: Vec<String> = state
            .buckets
            .keys()
            .chain(state.objects.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn list_objects_page(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ObjectListPage, StorageError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;

        if self.fail_listing {
            return Err(StorageError::AccessDenied {
                resource: bucket.to_string(),
                message: "listing denied".to_string(),
            });
        }

        let mut all: Vec<ObjectInfo> = state
            .objects
            .get(bucket)
            .map(|b| {
                b.iter()
                    .map(|(key, object)| ObjectInfo {
                        key: key.clone(),
                        size: object.size,
                        last_modified: None,
                        etag: Some(object.etag.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default();
        all.sort_by(|a, b| a.key.cmp(&b.key));

        let start: usize = continuation_token
            .map(|t| t.parse().unwrap())
            .unwrap_or(0);
        let end: usize = (start + self.page_size).min(all.len());
        let next_continuation_token = if end < all.len() {
            Some(end.to_string())
        } else {
            None
        };

        Ok(ObjectListPage {
            objects: all[start..end].to_vec(),
            next_continuation_token,
        })
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        file_path: &Path,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.state.lock().unwrap().uploads.push(key.to_string());

        if self.slow_keys.contains(key) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        if self.failing_keys.contains(key) {
            return Err(StorageError::NetworkError {
                message: format!("connection reset while uploading {}", key),
                retryable: true,
            });
        }

        if let Some(path) = self.delete_on_upload.get(key) {
            std::fs::remove_file(path).unwrap();
        }

        let data = std::fs::read(file_path).map_err(|e| StorageError::IoError {
            path: file_path.display().to_string(),
            message: e.to_string(),
        })?;
        let etag = fingerprint_bytes(&data, self.chunk_size)
            .map(|f| f.as_str().to_string())
            .unwrap_or_else(|| EMPTY_ETAG.to_string());

        let mut state = self.state.lock().unwrap();
        state.objects.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                etag,
                size: data.len() as u64,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn bucket_region(&self, bucket: &str) -> Result<String, StorageError> {
        let state = self.state.lock().unwrap();
        state
            .buckets
            .get(bucket)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                resource: bucket.to_string(),
            })
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        region: &str,
    ) -> Result<CreateBucketOutcome, StorageError> {
        let mut state = self.state.lock().unwrap();
        if state.buckets.contains_key(bucket) {
            return Ok(CreateBucketOutcome::AlreadyOwned);
        }
        state.buckets.insert(bucket.to_string(), region.to_string());
        Ok(CreateBucketOutcome::Created)
    }

    async fn set_public_read_policy(&self, bucket: &str) -> Result<(), StorageError> {
        self.state
            .lock()
            .unwrap()
            .policies
            .insert(bucket.to_string(), true);
        Ok(())
    }

    async fn configure_website(
        &self,
        bucket: &str,
        index_document: &str,
        error_document: &str,
    ) -> Result<(), StorageError> {
        self.state.lock().unwrap().websites.insert(
            bucket.to_string(),
            (index_document.to_string(), error_document.to_string()),
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct DnsState {
    zones: Vec<HostedZone>,
    records: Vec<(String, String, AliasTarget)>,
    created: usize,
}

/// Mock DNS service holding zones and alias records in memory.
#[derive(Debug, Clone, Default)]
pub struct MockDns {
    state: Arc<Mutex<DnsState>>,
}

impl MockDns {
    pub fn with_zone(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().zones.push(HostedZone {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn zones_created(&self) -> usize {
        self.state.lock().unwrap().created
    }

    pub fn zones(&self) -> Vec<HostedZone> {
        self.state.lock().unwrap().zones.clone()
    }

    /// Alias records as (zone id, domain, target).
    pub fn records(&self) -> Vec<(String, String, AliasTarget)> {
        self.state.lock().unwrap().records.clone()
    }
}

#[async_trait]
impl DnsService for MockDns {
    async fn find_hosted_zone(&self, domain: &str) -> Result<Option<HostedZone>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .zones
            .iter()
            .find(|zone| siteship_storage::zone_matches_domain(domain, &zone.name))
            .cloned())
    }

    async fn create_hosted_zone(&self, domain: &str) -> Result<HostedZone, StorageError> {
        let mut state = self.state.lock().unwrap();
        state.created += 1;
        let zone = HostedZone {
            id: format!("/hostedzone/Z{}", state.created),
            name: siteship_storage::apex_zone_name(domain),
        };
        state.zones.push(zone.clone());
        Ok(zone)
    }

    async fn upsert_alias_record(
        &self,
        zone: &HostedZone,
        domain: &str,
        target: &AliasTarget,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state
            .records
            .retain(|(zone_id, name, _)| !(zone_id == &zone.id && name == domain));
        state
            .records
            .push((zone.id.clone(), domain.to_string(), target.clone()));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CdnState {
    distributions: Vec<Distribution>,
    certificates: Vec<Certificate>,
    created: Vec<(String, String)>,
    waited: Vec<String>,
}

/// Mock CDN with in-memory distributions and certificates.
#[derive(Debug, Clone, Default)]
pub struct MockCdn {
    state: Arc<Mutex<CdnState>>,
}

impl MockCdn {
    pub fn with_distribution(self, id: &str, domain_name: &str, alias: &str) -> Self {
        self.state.lock().unwrap().distributions.push(Distribution {
            id: id.to_string(),
            domain_name: domain_name.to_string(),
            aliases: vec![alias.to_string()],
        });
        self
    }

    pub fn with_certificate(self, arn: &str, domain_name: &str, alternative_names: &[&str]) -> Self {
        self.state.lock().unwrap().certificates.push(Certificate {
            arn: arn.to_string(),
            domain_name: domain_name.to_string(),
            alternative_names: alternative_names.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Created distributions as (domain, certificate arn).
    pub fn created(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn waited(&self) -> Vec<String> {
        self.state.lock().unwrap().waited.clone()
    }
}

#[async_trait]
impl CdnService for MockCdn {
    async fn find_distribution(&self, domain: &str) -> Result<Option<Distribution>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .distributions
            .iter()
            .find(|d| d.aliases.iter().any(|alias| alias == domain))
            .cloned())
    }

    async fn find_certificate(&self, domain: &str) -> Result<Option<Certificate>, StorageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .certificates
            .iter()
            .find(|cert| {
                siteship_storage::certificate_covers(domain, &[cert.domain_name.as_str()])
                    || siteship_storage::certificate_covers(domain, cert.alternative_names.as_slice())
            })
            .cloned())
    }

    async fn create_distribution(
        &self,
        domain: &str,
        certificate: &Certificate,
    ) -> Result<Distribution, StorageError> {
        let mut state = self.state.lock().unwrap();
        state
            .created
            .push((domain.to_string(), certificate.arn.clone()));
        let distribution = Distribution {
            id: format!("E{}", state.created.len()),
            domain_name: format!("d{}.cloudfront.net", state.created.len()),
            aliases: vec![domain.to_string()],
        };
        state.distributions.push(distribution.clone());
        Ok(distribution)
    }

    async fn wait_until_deployed(&self, distribution: &Distribution) -> Result<(), StorageError> {
        self.state
            .lock()
            .unwrap()
            .waited
            .push(distribution.id.clone());
        Ok(())
    }
}
