//! Flattening paged metric results into flat records
//!
//! A GetMetricData page carries one time series per query, as parallel
//! timestamp/value arrays. Flattening is a pure fan-out: one record per
//! (timestamp, value) pair, array order preserved (descending timestamps,
//! matching the fetch scan order).

use chrono::{DateTime, Utc};

/// One metric's time series from a GetMetricData page
///
/// `timestamps` and `values` are parallel arrays of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub id: String,
    pub label: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

/// One CSV row: a single datapoint tagged with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    pub account_id: String,
    pub region: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    /// The series label split on spaces, one CSV column per part.
    /// Labels with embedded spaces produce a variable column count;
    /// downstream consumers must tolerate that.
    pub label_parts: Vec<String>,
}

/// Flatten one series into one record per datapoint.
pub fn flatten_series(account_id: &str, region: &str, series: &MetricSeries) -> Vec<FlatRecord> {
    let label_parts: Vec<String> = series
        .label
        .split(' ')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();

    series
        .timestamps
        .iter()
        .zip(series.values.iter())
        .map(|(&timestamp, &value)| FlatRecord {
            account_id: account_id.to_string(),
            region: region.to_string(),
            timestamp,
            value,
            label_parts: label_parts.clone(),
        })
        .collect()
}

/// Flatten every series of a page, preserving series order.
pub fn flatten_page(account_id: &str, region: &str, page: &[MetricSeries]) -> Vec<FlatRecord> {
    page.iter()
        .flat_map(|series| flatten_series(account_id, region, series))
        .collect()
}
