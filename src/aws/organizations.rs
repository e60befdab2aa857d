//! Organization member account enumeration

use crate::aws::account::AccountId;
use crate::aws::context::AwsContext;
use anyhow::{Context, Result};
use aws_sdk_organizations::types::AccountStatus;
use aws_sdk_organizations::Client;
use tracing::{debug, info};

/// Organizations client for listing member accounts
pub struct OrganizationsClient {
    client: Client,
}

impl OrganizationsClient {
    /// Create an Organizations client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.organizations_client(),
        }
    }

    /// List every active account in the organization, following pagination
    /// until the token is exhausted. Suspended and pending accounts are
    /// filtered out.
    pub async fn list_active_accounts(&self) -> Result<Vec<AccountId>> {
        let mut accounts = Vec::new();
        let mut next_token = None;

        loop {
            let mut request = self.client.list_accounts();
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }

            let response = request
                .send()
                .await
                .context("Failed to list organization accounts")?;

            for account in response.accounts() {
                if !matches!(account.status(), Some(AccountStatus::Active)) {
                    debug!(
                        account_id = ?account.id(),
                        status = ?account.status(),
                        "Skipping inactive account"
                    );
                    continue;
                }
                if let Some(id) = account.id() {
                    accounts.push(AccountId::new(id));
                }
            }

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        info!(count = accounts.len(), "Enumerated active organization accounts");

        Ok(accounts)
    }
}
