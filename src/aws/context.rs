//! Shared AWS configuration context
//!
//! Provides `AwsContext` for loading AWS SDK configuration once and creating
//! multiple service clients from the same config. A context is either backed
//! by the caller's base credentials or by assumed-role credentials for one
//! member account.

use crate::aws::sts::AssumedCredentials;
use aws_config::{timeout::TimeoutConfig, BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use std::sync::Arc;
use std::time::Duration;

/// Per-attempt timeout applied to every SDK call so a stalled account cannot
/// stall the whole run.
const OPERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared AWS configuration context for creating service clients.
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

impl AwsContext {
    /// Load AWS configuration for the specified region using the caller's
    /// base credentials (environment, config files, IAM roles).
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .timeout_config(operation_timeouts())
            .load()
            .await;

        Self {
            config: Arc::new(config),
            region: region.to_string(),
        }
    }

    /// Load a context backed by assumed-role credentials for one member
    /// account. The credentials live only as long as this context; nothing
    /// is cached across accounts.
    pub async fn with_assumed_role(credentials: &AssumedCredentials, region: &str) -> Self {
        let provider = Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            Some(credentials.session_token.clone()),
            credentials.expiry.map(Into::into),
            "AssumeRole",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(provider)
            .timeout_config(operation_timeouts())
            .load()
            .await;

        Self {
            config: Arc::new(config),
            region: region.to_string(),
        }
    }

    /// Get the underlying SDK config for direct client construction.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// Get the region string.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Create an Organizations client from this context.
    pub fn organizations_client(&self) -> aws_sdk_organizations::Client {
        aws_sdk_organizations::Client::new(self.sdk_config())
    }

    /// Create an STS client from this context.
    pub fn sts_client(&self) -> aws_sdk_sts::Client {
        aws_sdk_sts::Client::new(self.sdk_config())
    }

    /// Create a CloudWatch client from this context.
    pub fn cloudwatch_client(&self) -> aws_sdk_cloudwatch::Client {
        aws_sdk_cloudwatch::Client::new(self.sdk_config())
    }

    /// Create an S3 client from this context.
    pub fn s3_client(&self) -> aws_sdk_s3::Client {
        aws_sdk_s3::Client::new(self.sdk_config())
    }
}

fn operation_timeouts() -> TimeoutConfig {
    TimeoutConfig::builder()
        .operation_attempt_timeout(OPERATION_TIMEOUT)
        .build()
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn context_creation() {
        let ctx = AwsContext::new("us-east-1").await;
        assert_eq!(ctx.region(), "us-east-1");
    }

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn context_clone_shares_config() {
        let ctx1 = AwsContext::new("us-east-1").await;
        let ctx2 = ctx1.clone();
        assert_eq!(ctx1.region(), ctx2.region());
    }
}
