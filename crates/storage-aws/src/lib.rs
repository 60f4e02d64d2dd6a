//! AWS SDK backends for siteship.
//!
//! This crate implements the `siteship-storage` capability traits on the AWS
//! SDK for Rust: [`S3ObjectStore`] for buckets and uploads, [`Route53Dns`]
//! for hosted zones and [`CloudFrontCdn`] for distributions and ACM
//! certificates.
//!
//! # Example
//!
//! ```ignore
//! use siteship_storage::{StorageSettings, SyncPlanner};
//! use siteship_storage_aws::AwsServices;
//!
//! let services = AwsServices::load(&StorageSettings::default()).await?;
//! let store = services.object_store();
//! let report = SyncPlanner::new(&store).sync(Path::new("./site"), "www.example.com").await?;
//! ```

mod cloudfront;
mod error;
mod route53;
mod s3;
mod services;

pub use cloudfront::CloudFrontCdn;
pub use error::AwsError;
pub use route53::Route53Dns;
pub use s3::S3ObjectStore;
pub use services::AwsServices;
