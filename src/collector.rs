//! Run orchestration: accounts, regions, and catalog tasks
//!
//! Sequential single pass over every (account, region, task) unit. Units
//! are independent: a failed unit is logged, counted in the run summary,
//! and never terminates the run. Re-runs overwrite prior objects, so the
//! whole pipeline is idempotent per collection window.

use crate::aws::{
    get_current_account_id, AccountId, AssumedCredentials, AwsContext, CloudWatchClient,
    OrganizationsClient, S3Client, StsClient,
};
use crate::catalog::{self, CollectionTask};
use crate::config::RunConfig;
use crate::flatten;
use crate::query::{self, Statistic};
use crate::retry::{with_retry, RetryConfig};
use crate::sink::CsvSink;
use anyhow::Result;
use serde::Serialize;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Failure of one collection unit, by pipeline stage
#[derive(Debug, Error)]
pub enum CollectError {
    /// Role assumption denied or failed; the whole account is skipped
    #[error("role assumption failed for account {account_id}: {reason}")]
    Authorization { account_id: String, reason: String },

    /// Metric listing or retrieval failed after retries; the task is skipped
    #[error("metric fetch failed for {namespace} in {region}: {reason}")]
    Fetch {
        namespace: String,
        region: String,
        reason: String,
    },

    /// CSV upload failed; the task is skipped, no retry
    #[error("failed to write {key}: {reason}")]
    Sink { key: String, reason: String },
}

/// Pipeline stage at which a unit was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Authorization,
    Fetch,
    Sink,
}

/// One skipped unit, with enough context to re-run it manually
#[derive(Debug, Clone, Serialize)]
pub struct SkippedUnit {
    pub stage: FailureStage,
    pub account_id: String,
    pub region: Option<String>,
    pub namespace: Option<String>,
    pub filename: Option<String>,
    pub error: String,
}

/// Outcome of one collection run
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub accounts_total: usize,
    pub objects_written: usize,
    pub records_written: usize,
    pub skipped: Vec<SkippedUnit>,
}

impl RunSummary {
    pub fn authorization_failures(&self) -> usize {
        self.failures_at(FailureStage::Authorization)
    }

    pub fn fetch_failures(&self) -> usize {
        self.failures_at(FailureStage::Fetch)
    }

    pub fn sink_failures(&self) -> usize {
        self.failures_at(FailureStage::Sink)
    }

    fn failures_at(&self, stage: FailureStage) -> usize {
        self.skipped.iter().filter(|s| s.stage == stage).count()
    }

    fn record_account_skip(&mut self, account_id: &AccountId, error: &CollectError) {
        self.skipped.push(SkippedUnit {
            stage: FailureStage::Authorization,
            account_id: account_id.to_string(),
            region: None,
            namespace: None,
            filename: None,
            error: error.to_string(),
        });
    }

    fn merge_account(&mut self, outcome: AccountOutcome) {
        self.objects_written += outcome.objects_written;
        self.records_written += outcome.records_written;
        self.skipped.extend(outcome.skipped);
    }
}

/// Tallies from one account's collection, merged into the run summary
#[derive(Debug, Default)]
struct AccountOutcome {
    objects_written: usize,
    records_written: usize,
    skipped: Vec<SkippedUnit>,
}

impl AccountOutcome {
    fn record_task_skip(
        &mut self,
        account_id: &AccountId,
        region: &str,
        task: &CollectionTask,
        error: &CollectError,
    ) {
        let stage = match error {
            CollectError::Authorization { .. } => FailureStage::Authorization,
            CollectError::Fetch { .. } => FailureStage::Fetch,
            CollectError::Sink { .. } => FailureStage::Sink,
        };
        self.skipped.push(SkippedUnit {
            stage,
            account_id: account_id.to_string(),
            region: Some(region.to_string()),
            namespace: Some(task.namespace.to_string()),
            filename: Some(task.filename.to_string()),
            error: error.to_string(),
        });
    }
}

/// Run one collection pass over the whole organization.
pub async fn run(config: RunConfig) -> Result<RunSummary> {
    let run_id = Uuid::now_v7();

    if config.regions.is_empty() {
        warn!("No regions configured, nothing to collect");
        return Ok(RunSummary::default());
    }

    let home = AwsContext::new(&config.home_region).await;
    let caller = get_current_account_id(home.sdk_config()).await?;
    info!(
        run_id = %run_id,
        caller_account = %caller,
        regions = ?config.regions,
        start = %config.start_time,
        end = %config.end_time,
        "Starting collection run"
    );

    let organizations = OrganizationsClient::from_context(&home);
    let sts = StsClient::from_context(&home);
    let retry = RetryConfig::default();

    let accounts = with_retry(&retry, "ListAccounts", || {
        organizations.list_active_accounts()
    })
    .await?;

    let mut summary = RunSummary {
        accounts_total: accounts.len(),
        ..RunSummary::default()
    };

    let session_name = format!("org-metrics-{run_id}");

    collect_accounts(
        &accounts,
        &mut summary,
        |account_id| {
            let sts = &sts;
            let role_name = &config.role_name;
            let session_name = &session_name;
            async move {
                sts.assume_collection_role(&account_id, role_name, session_name)
                    .await
            }
        },
        |account_id, credentials| {
            let config = &config;
            let retry = &retry;
            async move { collect_account(config, retry, &account_id, &credentials).await }
        },
    )
    .await;

    info!(
        run_id = %run_id,
        accounts = summary.accounts_total,
        objects = summary.objects_written,
        records = summary.records_written,
        skipped = summary.skipped.len(),
        "Collection run finished"
    );

    Ok(summary)
}

/// Iterate accounts, assuming the collection role for each.
///
/// A failed assumption records one authorization skip and moves on to the
/// next account; it never aborts the rest of the organization. The role
/// assumption and per-account collection are parameters so this policy can
/// be exercised without live credentials.
async fn collect_accounts<A, AFut, C, CFut>(
    accounts: &[AccountId],
    summary: &mut RunSummary,
    assume: A,
    collect: C,
) where
    A: Fn(AccountId) -> AFut,
    AFut: Future<Output = Result<AssumedCredentials>>,
    C: Fn(AccountId, AssumedCredentials) -> CFut,
    CFut: Future<Output = AccountOutcome>,
{
    for account_id in accounts {
        match assume(account_id.clone()).await {
            Ok(credentials) => {
                let outcome = collect(account_id.clone(), credentials).await;
                summary.merge_account(outcome);
            }
            Err(error) => {
                let error = CollectError::Authorization {
                    account_id: account_id.to_string(),
                    reason: format!("{error:#}"),
                };
                warn!(account_id = %account_id, error = %error, "Skipping account");
                summary.record_account_skip(account_id, &error);
            }
        }
    }
}

/// Collect every configured region and catalog task for one account.
async fn collect_account(
    config: &RunConfig,
    retry: &RetryConfig,
    account_id: &AccountId,
    credentials: &AssumedCredentials,
) -> AccountOutcome {
    let mut outcome = AccountOutcome::default();

    for region in &config.regions {
        let ctx = AwsContext::with_assumed_role(credentials, region).await;
        let cloudwatch = CloudWatchClient::from_context(&ctx);
        let sink = CsvSink::new(S3Client::from_context(&ctx), config.bucket.clone());

        for task in catalog::CATALOG {
            match collect_task(&cloudwatch, &sink, config, retry, account_id, region, task).await {
                Ok(written) => {
                    if written > 0 {
                        outcome.objects_written += 1;
                        outcome.records_written += written;
                    }
                }
                Err(error) => {
                    warn!(
                        account_id = %account_id,
                        region = %region,
                        namespace = %task.namespace,
                        filename = %task.filename,
                        error = %error,
                        "Skipping collection task"
                    );
                    outcome.record_task_skip(account_id, region, task, &error);
                }
            }
        }
    }

    outcome
}

/// Collect one catalog task for one account and region.
///
/// Returns the number of records written, zero when the account has no
/// matching metrics in this region.
async fn collect_task(
    cloudwatch: &CloudWatchClient,
    sink: &CsvSink,
    config: &RunConfig,
    retry: &RetryConfig,
    account_id: &AccountId,
    region: &str,
    task: &CollectionTask,
) -> Result<usize, CollectError> {
    let fetch_error = |error: anyhow::Error| CollectError::Fetch {
        namespace: task.namespace.to_string(),
        region: region.to_string(),
        reason: format!("{error:#}"),
    };

    let descriptors = with_retry(retry, "ListMetrics", || cloudwatch.list_metrics(task))
        .await
        .map_err(|error| fetch_error(error))?;

    if descriptors.is_empty() {
        debug!(
            account_id = %account_id,
            region = %region,
            namespace = %task.namespace,
            "No matching metrics, nothing to write"
        );
        return Ok(0);
    }

    let batches =
        query::build_query_batches(descriptors, config.period_seconds, Statistic::Average);

    let mut records = Vec::new();
    for batch in &batches {
        let series = with_retry(retry, "GetMetricData", || {
            cloudwatch.get_metric_data(batch, config.start_time, config.end_time)
        })
        .await
        .map_err(|error| fetch_error(error))?;

        records.extend(flatten::flatten_page(account_id.as_str(), region, &series));
    }

    if records.is_empty() {
        debug!(
            account_id = %account_id,
            region = %region,
            namespace = %task.namespace,
            "No datapoints in window, nothing to write"
        );
        return Ok(0);
    }

    let key = task.object_key(account_id.as_str(), region);
    sink.write(&key, &records).await.map_err(|error| CollectError::Sink {
        key: key.clone(),
        reason: format!("{error:#}"),
    })?;

    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn account(id: &str) -> AccountId {
        AccountId::new(id)
    }

    fn stub_credentials() -> AssumedCredentials {
        AssumedCredentials {
            access_key_id: "AKIAEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: "token".to_string(),
            expiry: None,
        }
    }

    #[tokio::test]
    async fn denied_account_skipped_rest_still_collected() {
        let accounts = vec![
            account("111111111111"),
            account("222222222222"),
            account("333333333333"),
        ];
        let mut summary = RunSummary {
            accounts_total: accounts.len(),
            ..RunSummary::default()
        };
        let collected = RefCell::new(Vec::new());

        collect_accounts(
            &accounts,
            &mut summary,
            |account_id| async move {
                if account_id.as_str() == "111111111111" {
                    anyhow::bail!("AccessDenied: role assumption refused")
                }
                Ok(stub_credentials())
            },
            |account_id, _credentials| {
                let collected = &collected;
                async move {
                    collected.borrow_mut().push(account_id.to_string());
                    AccountOutcome {
                        objects_written: 1,
                        records_written: 3,
                        skipped: Vec::new(),
                    }
                }
            },
        )
        .await;

        // The denied account never reaches collection; the rest do
        assert_eq!(*collected.borrow(), ["222222222222", "333333333333"]);
        assert_eq!(summary.authorization_failures(), 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].account_id, "111111111111");
        assert!(summary.skipped[0].error.contains("AccessDenied"));

        // Tallies from the surviving accounts land in the summary
        assert_eq!(summary.objects_written, 2);
        assert_eq!(summary.records_written, 6);
    }

    #[test]
    fn summary_counts_failures_by_stage() {
        let mut summary = RunSummary {
            accounts_total: 3,
            ..RunSummary::default()
        };

        let auth = CollectError::Authorization {
            account_id: "111111111111".to_string(),
            reason: "AccessDenied".to_string(),
        };
        summary.record_account_skip(&account("111111111111"), &auth);

        let fetch = CollectError::Fetch {
            namespace: "AWS/EC2".to_string(),
            region: "us-west-2".to_string(),
            reason: "ThrottlingException".to_string(),
        };
        let mut outcome = AccountOutcome::default();
        let task = &catalog::CATALOG[0];
        outcome.record_task_skip(&account("222222222222"), "us-west-2", task, &fetch);
        summary.merge_account(outcome);

        assert_eq!(summary.authorization_failures(), 1);
        assert_eq!(summary.fetch_failures(), 1);
        assert_eq!(summary.sink_failures(), 0);
        assert_eq!(summary.skipped.len(), 2);
    }

    #[test]
    fn task_skip_carries_rerun_context() {
        let error = CollectError::Sink {
            key: "AWS/EC2/111111111111/us-west-2/EC2_CPUUtilization.csv".to_string(),
            reason: "NoSuchBucket".to_string(),
        };
        let mut outcome = AccountOutcome::default();
        let task = &catalog::CATALOG[0];
        outcome.record_task_skip(&account("111111111111"), "us-west-2", task, &error);

        let mut summary = RunSummary::default();
        summary.merge_account(outcome);

        let skipped = &summary.skipped[0];
        assert_eq!(skipped.stage, FailureStage::Sink);
        assert_eq!(skipped.region.as_deref(), Some("us-west-2"));
        assert_eq!(skipped.namespace.as_deref(), Some("AWS/EC2"));
        assert_eq!(skipped.filename.as_deref(), Some("EC2_CPUUtilization"));
        assert!(skipped.error.contains("NoSuchBucket"));
    }

    #[tokio::test]
    async fn empty_region_list_collects_nothing() {
        let config = RunConfig::new(
            "metrics-bucket".to_string(),
            vec![],
            "OrganizationAccountAccessRole".to_string(),
            "us-east-1".to_string(),
            300,
            1,
        );

        // Returns before any provider call, so no credentials are needed.
        let summary = run(config).await.unwrap();
        assert_eq!(summary.objects_written, 0);
        assert_eq!(summary.records_written, 0);
        assert!(summary.skipped.is_empty());
    }
}
