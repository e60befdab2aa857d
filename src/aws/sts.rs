//! Cross-account role assumption

use crate::aws::account::AccountId;
use crate::aws::context::AwsContext;
use crate::config::ASSUME_ROLE_DURATION_SECONDS;
use anyhow::{Context, Result};
use aws_sdk_sts::Client;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Temporary credentials for one member account
///
/// Owned by the account iteration that requested them; never cached or
/// reused across accounts.
#[derive(Clone)]
pub struct AssumedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiry: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AssumedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssumedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

/// Build the ARN of the collection role in a member account.
pub fn role_arn(account_id: &str, role_name: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{role_name}")
}

/// STS client for assuming the collection role in member accounts
pub struct StsClient {
    client: Client,
}

impl StsClient {
    /// Create an STS client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.sts_client(),
        }
    }

    /// Assume the collection role in one member account.
    ///
    /// Denied assumption surfaces as an error; the caller skips the account
    /// and continues with the rest of the organization.
    pub async fn assume_collection_role(
        &self,
        account_id: &AccountId,
        role_name: &str,
        session_name: &str,
    ) -> Result<AssumedCredentials> {
        let arn = role_arn(account_id.as_str(), role_name);
        debug!(role_arn = %arn, session = %session_name, "Assuming collection role");

        let response = self
            .client
            .assume_role()
            .role_arn(&arn)
            .role_session_name(session_name)
            .duration_seconds(ASSUME_ROLE_DURATION_SECONDS)
            .send()
            .await
            .with_context(|| format!("Failed to assume role {arn}"))?;

        let credentials = response
            .credentials()
            .with_context(|| format!("No credentials returned for role {arn}"))?;

        let expiration = credentials.expiration();
        Ok(AssumedCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiry: DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos()),
        })
    }
}
