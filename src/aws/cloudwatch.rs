//! CloudWatch metric listing and data retrieval
//!
//! Both operations are cursor-paginated; each loop follows the token until
//! the provider reports exhaustion. Batching of GetMetricData queries
//! happens upstream in [`crate::query`]; this module only enforces the
//! datapoint page hint.

use crate::aws::context::AwsContext;
use crate::catalog::CollectionTask;
use crate::flatten::MetricSeries;
use crate::query::{MetricDescriptor, MetricQuery};
use anyhow::{Context, Result};
use aws_sdk_cloudwatch::{
    primitives::DateTime as AwsDateTime,
    types::{
        Dimension, DimensionFilter, Metric, MetricDataQuery, MetricDataResult, MetricStat, ScanBy,
    },
    Client,
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// GetMetricData returns at most 100,800 datapoints in one request; used as
/// the page-size hint.
const MAX_DATAPOINTS_PER_PAGE: i32 = 100_800;

/// CloudWatch client for one account and region
pub struct CloudWatchClient {
    client: Client,
}

impl CloudWatchClient {
    /// Create a CloudWatch client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cloudwatch_client(),
        }
    }

    /// List the metrics matching a catalog task, following pagination until
    /// exhausted. Only metrics that exist in this account and region come
    /// back, so empty results are common and not an error.
    pub async fn list_metrics(&self, task: &CollectionTask) -> Result<Vec<MetricDescriptor>> {
        let mut descriptors = Vec::new();
        let mut next_token = None;

        loop {
            let mut request = self.client.list_metrics().namespace(task.namespace);
            if let Some(name) = task.metric_name {
                request = request.metric_name(name);
            }
            for dimension_name in task.dimension_names {
                request = request.dimensions(
                    DimensionFilter::builder().name(*dimension_name).build(),
                );
            }
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to list metrics in {}", task.namespace))?;

            for metric in response.metrics() {
                descriptors.push(descriptor_from_metric(metric));
            }

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(
            namespace = %task.namespace,
            metric = ?task.metric_name,
            count = descriptors.len(),
            "Listed metrics"
        );

        Ok(descriptors)
    }

    /// Fetch one query batch (at most 500 queries), following GetMetricData
    /// pagination until exhausted. Results are ordered by descending
    /// timestamp per the scan order.
    pub async fn get_metric_data(
        &self,
        batch: &[MetricQuery],
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Vec<MetricSeries>> {
        let queries: Vec<MetricDataQuery> = batch.iter().map(to_sdk_query).collect();

        let mut series = Vec::new();
        let mut next_token = None;

        loop {
            let mut request = self
                .client
                .get_metric_data()
                .set_metric_data_queries(Some(queries.clone()))
                .start_time(AwsDateTime::from_secs(start_time.timestamp()))
                .end_time(AwsDateTime::from_secs(end_time.timestamp()))
                .scan_by(ScanBy::TimestampDescending)
                .max_datapoints(MAX_DATAPOINTS_PER_PAGE);
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }

            let response = request.send().await.context("Failed to get metric data")?;

            for result in response.metric_data_results() {
                series.push(series_from_result(result));
            }

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(queries = batch.len(), series = series.len(), "Fetched metric data");

        Ok(series)
    }
}

fn descriptor_from_metric(metric: &Metric) -> MetricDescriptor {
    MetricDescriptor {
        namespace: metric.namespace().unwrap_or_default().to_string(),
        metric_name: metric.metric_name().unwrap_or_default().to_string(),
        dimensions: metric
            .dimensions()
            .iter()
            .map(|d| {
                (
                    d.name().unwrap_or_default().to_string(),
                    d.value().unwrap_or_default().to_string(),
                )
            })
            .collect(),
    }
}

fn to_sdk_query(query: &MetricQuery) -> MetricDataQuery {
    let dimensions: Vec<Dimension> = query
        .descriptor
        .dimensions
        .iter()
        .map(|(name, value)| Dimension::builder().name(name).value(value).build())
        .collect();

    MetricDataQuery::builder()
        .id(&query.id)
        .metric_stat(
            MetricStat::builder()
                .metric(
                    Metric::builder()
                        .namespace(&query.descriptor.namespace)
                        .metric_name(&query.descriptor.metric_name)
                        .set_dimensions(Some(dimensions))
                        .build(),
                )
                .period(query.period_seconds)
                .stat(query.stat.as_str())
                .build(),
        )
        .build()
}

fn series_from_result(result: &MetricDataResult) -> MetricSeries {
    MetricSeries {
        id: result.id().unwrap_or_default().to_string(),
        label: result.label().unwrap_or_default().to_string(),
        timestamps: result
            .timestamps()
            .iter()
            .map(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()).unwrap_or_default())
            .collect(),
        values: result.values().to_vec(),
    }
}
