//! Error types for the AWS backends.

use std::error::Error as StdError;
use std::fmt::Debug;

use aws_sdk_s3::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError};
use siteship_storage::StorageError;
use thiserror::Error;

/// Errors raised inside the AWS backends before they reach a trait boundary.
#[derive(Error, Debug)]
pub enum AwsError {
    /// AWS SDK error.
    #[error("AWS SDK error: {message}")]
    SdkError { message: String, retryable: bool },

    /// A request could not be built.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<BuildError> for AwsError {
    fn from(err: BuildError) -> Self {
        AwsError::ConfigError(err.to_string())
    }
}

impl From<AwsError> for StorageError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::SdkError { message, retryable } => {
                StorageError::NetworkError { message, retryable }
            }
            AwsError::ConfigError(message) => StorageError::InvalidConfig { message },
        }
    }
}

/// Translate an SDK call failure on `resource` into a `StorageError`.
///
/// Works for every service crate, they share the same `SdkError` type.
pub(crate) fn sdk_error<E, R>(resource: &str, err: SdkError<E, R>) -> StorageError
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
    R: Debug,
{
    let code: Option<String> = err
        .as_service_error()
        .and_then(|e| e.code())
        .map(str::to_string);
    let message: String = DisplayErrorContext(&err).to_string();

    match code.as_deref() {
        Some("AccessDenied") | Some("AccessDeniedException") | Some("Forbidden") => {
            StorageError::AccessDenied {
                resource: resource.to_string(),
                message,
            }
        }
        Some("NoSuchBucket") | Some("NoSuchKey") | Some("NotFound")
        | Some("NoSuchHostedZone") | Some("NoSuchDistribution") => StorageError::NotFound {
            resource: resource.to_string(),
        },
        Some("SlowDown") | Some("Throttling") | Some("ThrottlingException")
        | Some("RequestTimeout") | Some("PriorRequestNotComplete") => {
            StorageError::NetworkError {
                message,
                retryable: true,
            }
        }
        _ => StorageError::NetworkError {
            retryable: matches!(
                err,
                SdkError::TimeoutError(_) | SdkError::DispatchFailure(_)
            ),
            message,
        },
    }
}
