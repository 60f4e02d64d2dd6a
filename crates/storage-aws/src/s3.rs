//! S3 object store.

use std::io::SeekFrom;
use std::path::Path;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CompletedMultipartUpload, CompletedPart, CreateBucketConfiguration,
    ErrorDocument, IndexDocument, WebsiteConfiguration,
};
use aws_sdk_s3::Client as S3Client;
use siteship_storage::{
    generate_chunks, needs_chunking, public_read_policy, ChunkInfo, CreateBucketOutcome,
    ObjectInfo, ObjectListPage, ObjectStore, StorageError,
};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::{sdk_error, AwsError};

/// `ObjectStore` implementation on S3.
///
/// Files larger than `chunk_size` are sent as multipart uploads with parts of
/// exactly `chunk_size` bytes, so S3 assigns the same composite ETag the
/// local fingerprint produces.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    /// The underlying S3 client.
    s3_client: S3Client,
    /// Multipart part size.
    chunk_size: u64,
}

impl S3ObjectStore {
    /// Create a store from a loaded SDK configuration.
    pub fn new(sdk_config: &SdkConfig, chunk_size: u64) -> Self {
        Self {
            s3_client: S3Client::new(sdk_config),
            chunk_size,
        }
    }

    /// Create a store from an existing S3Client (for testing).
    pub fn from_client(s3_client: S3Client, chunk_size: u64) -> Self {
        Self {
            s3_client,
            chunk_size,
        }
    }

    async fn put_whole_file(
        &self,
        bucket: &str,
        key: &str,
        file_path: &Path,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let body = ByteStream::from_path(file_path)
            .await
            .map_err(|e| StorageError::IoError {
                path: file_path.display().to_string(),
                message: e.to_string(),
            })?;

        self.s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|err| sdk_error(key, err))?;

        Ok(())
    }

    async fn put_multipart(
        &self,
        bucket: &str,
        key: &str,
        file_path: &Path,
        size: u64,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let created = self
            .s3_client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| sdk_error(key, err))?;

        let upload_id: String = created
            .upload_id()
            .ok_or_else(|| StorageError::Other {
                message: format!("No upload ID returned for {}", key),
            })?
            .to_string();

        let parts = match self
            .upload_parts(bucket, key, &upload_id, file_path, size)
            .await
        {
            Ok(parts) => parts,
            Err(error) => {
                self.abort_multipart(bucket, key, &upload_id).await;
                return Err(error);
            }
        };

        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        let result = self
            .s3_client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(&upload_id)
            .multipart_upload(completed)
            .send()
            .await;

        if let Err(err) = result {
            self.abort_multipart(bucket, key, &upload_id).await;
            return Err(sdk_error(key, err));
        }

        Ok(())
    }

    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        file_path: &Path,
        size: u64,
    ) -> Result<Vec<CompletedPart>, StorageError> {
        let mut file = File::open(file_path).await.map_err(|e| StorageError::IoError {
            path: file_path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut parts: Vec<CompletedPart> = Vec::new();
        for chunk in generate_chunks(size, self.chunk_size) {
            let buffer: Vec<u8> = read_chunk(&mut file, &chunk)
                .await
                .map_err(|e| StorageError::IoError {
                    path: file_path.display().to_string(),
                    message: e.to_string(),
                })?;

            let output = self
                .s3_client
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(chunk.part_number())
                .body(ByteStream::from(buffer))
                .send()
                .await
                .map_err(|err| sdk_error(key, err))?;

            log::debug!(
                "Uploaded part {} of {} ({} bytes)",
                chunk.part_number(),
                key,
                chunk.length
            );

            parts.push(
                CompletedPart::builder()
                    .part_number(chunk.part_number())
                    .set_e_tag(output.e_tag().map(str::to_string))
                    .build(),
            );
        }

        Ok(parts)
    }

    async fn abort_multipart(&self, bucket: &str, key: &str, upload_id: &str) {
        let result = self
            .s3_client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await;

        if let Err(err) = result {
            log::warn!("Failed to abort multipart upload of {}: {}", key, err);
        }
    }
}

async fn read_chunk(file: &mut File, chunk: &ChunkInfo) -> std::io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(chunk.offset)).await?;
    let mut buffer: Vec<u8> = vec![0u8; chunk.length as usize];
    file.read_exact(&mut buffer).await?;
    Ok(buffer)
}

/// Map a GetBucketLocation constraint to a region name.
///
/// Buckets in `us-east-1` report no constraint; legacy `EU` buckets live in
/// `eu-west-1`.
fn region_from_location(constraint: Option<&str>) -> String {
    match constraint {
        None | Some("") => "us-east-1".to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}

fn website_configuration(
    index_document: &str,
    error_document: &str,
) -> Result<WebsiteConfiguration, AwsError> {
    Ok(WebsiteConfiguration::builder()
        .index_document(IndexDocument::builder().suffix(index_document).build()?)
        .error_document(ErrorDocument::builder().key(error_document).build()?)
        .build())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_buckets(&self) -> Result<Vec<String>, StorageError> {
        let output = self
            .s3_client
            .list_buckets()
            .send()
            .await
            .map_err(|err| sdk_error("buckets", err))?;

        let mut names: Vec<String> = output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn list_objects_page(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ObjectListPage, StorageError> {
        let mut request = self.s3_client.list_objects_v2().bucket(bucket);

        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| sdk_error(bucket, err))?;

        let mut objects: Vec<ObjectInfo> = Vec::new();
        if let Some(ref contents) = response.contents {
            for obj in contents {
                let last_modified: Option<i64> = obj
                    .last_modified()
                    .and_then(|dt| dt.to_millis().ok())
                    .map(|ms| ms / 1000);

                objects.push(ObjectInfo {
                    key: obj.key().unwrap_or_default().to_string(),
                    size: obj.size().map(|s| s as u64).unwrap_or(0),
                    last_modified,
                    etag: obj.e_tag().map(|s| s.to_string()),
                });
            }
        }

        let next_continuation_token = if response.is_truncated() == Some(true) {
            response.next_continuation_token.clone()
        } else {
            None
        };

        Ok(ObjectListPage {
            objects,
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
        let size: u64 = tokio::fs::metadata(file_path)
            .await
            .map_err(|e| StorageError::IoError {
                path: file_path.display().to_string(),
                message: e.to_string(),
            })?
            .len();

        if needs_chunking(size, self.chunk_size) {
            self.put_multipart(bucket, key, file_path, size, content_type)
                .await
        } else {
            self.put_whole_file(bucket, key, file_path, content_type)
                .await
        }
    }

    async fn bucket_region(&self, bucket: &str) -> Result<String, StorageError> {
        let output = self
            .s3_client
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| sdk_error(bucket, err))?;

        Ok(region_from_location(
            output.location_constraint().map(|c| c.as_str()),
        ))
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        region: &str,
    ) -> Result<CreateBucketOutcome, StorageError> {
        let mut request = self.s3_client.create_bucket().bucket(bucket);

        if region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(CreateBucketOutcome::Created),
            Err(err) => {
                let already_owned = err
                    .as_service_error()
                    .map(|e| e.is_bucket_already_owned_by_you())
                    .unwrap_or(false);
                if already_owned {
                    Ok(CreateBucketOutcome::AlreadyOwned)
                } else {
                    Err(sdk_error(bucket, err))
                }
            }
        }
    }

    async fn set_public_read_policy(&self, bucket: &str) -> Result<(), StorageError> {
        self.s3_client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(public_read_policy(bucket).to_string())
            .send()
            .await
            .map_err(|err| sdk_error(bucket, err))?;

        Ok(())
    }

    async fn configure_website(
        &self,
        bucket: &str,
        index_document: &str,
        error_document: &str,
    ) -> Result<(), StorageError> {
        let configuration = website_configuration(index_document, error_document)?;

        self.s3_client
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(configuration)
            .send()
            .await
            .map_err(|err| sdk_error(bucket, err))?;

        Ok(())
    }
}
