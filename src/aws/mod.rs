//! AWS client modules
//!
//! Thin wrappers around the AWS SDK clients used by the collector:
//! - Organizations: member account enumeration
//! - STS: cross-account role assumption and identity validation
//! - CloudWatch: metric listing and data retrieval
//! - S3: CSV object uploads

pub mod account;
pub mod cloudwatch;
pub mod context;
pub mod error;
pub mod organizations;
pub mod s3;
pub mod sts;

pub use account::{get_current_account_id, AccountId};
pub use cloudwatch::CloudWatchClient;
pub use context::AwsContext;
pub use error::{classify_anyhow_error, classify_aws_error, AwsError};
pub use organizations::OrganizationsClient;
pub use s3::S3Client;
pub use sts::{AssumedCredentials, StsClient};
