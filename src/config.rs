//! Run configuration and defaults

use chrono::{DateTime, Duration, Utc};

/// Cross-account role assumed in every member account. The role must exist
/// with the same name in each account and carry CloudWatch read permissions.
pub const DEFAULT_ROLE_NAME: &str = "OrganizationAccountAccessRole";

/// Default metric sampling period in seconds (CloudWatch standard resolution)
pub const DEFAULT_PERIOD_SECONDS: i32 = 300;

/// Default collection window, in hours back from now
pub const DEFAULT_LOOKBACK_HOURS: i64 = 1;

/// Session duration requested when assuming the cross-account role (1 hour)
pub const ASSUME_ROLE_DURATION_SECONDS: i32 = 3600;

/// Configuration for one collection run
///
/// Built once at startup and passed into the collector; nothing here is
/// mutated during a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Destination S3 bucket for CSV exports
    pub bucket: String,

    /// Regions to scan in each account. An empty list means no collection
    /// work happens at all.
    pub regions: Vec<String>,

    /// Name of the cross-account role to assume
    pub role_name: String,

    /// Region for Organizations/STS calls and the S3 uploads
    pub home_region: String,

    /// Metric sampling period in seconds
    pub period_seconds: i32,

    /// Start of the collection window (inclusive)
    pub start_time: DateTime<Utc>,

    /// End of the collection window (exclusive)
    pub end_time: DateTime<Utc>,
}

impl RunConfig {
    /// Build a config with the collection window anchored to the current time.
    pub fn new(
        bucket: String,
        regions: Vec<String>,
        role_name: String,
        home_region: String,
        period_seconds: i32,
        lookback_hours: i64,
    ) -> Self {
        let end_time = Utc::now();
        let start_time = end_time - Duration::hours(lookback_hours);

        Self {
            bucket,
            regions,
            role_name,
            home_region,
            period_seconds,
            start_time,
            end_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_lookback(hours: i64) -> RunConfig {
        RunConfig::new(
            "metrics-bucket".to_string(),
            vec!["us-west-2".to_string()],
            DEFAULT_ROLE_NAME.to_string(),
            "us-east-1".to_string(),
            DEFAULT_PERIOD_SECONDS,
            hours,
        )
    }

    #[test]
    fn window_spans_lookback() {
        let config = config_with_lookback(1);
        assert_eq!(config.end_time - config.start_time, Duration::hours(1));

        let config = config_with_lookback(24);
        assert_eq!(config.end_time - config.start_time, Duration::hours(24));
    }

    #[test]
    fn window_ends_now() {
        let before = Utc::now();
        let config = config_with_lookback(1);
        let after = Utc::now();

        assert!(config.end_time >= before);
        assert!(config.end_time <= after);
        assert!(config.start_time < config.end_time);
    }

    #[test]
    fn defaults() {
        assert_eq!(DEFAULT_ROLE_NAME, "OrganizationAccountAccessRole");
        assert_eq!(DEFAULT_PERIOD_SECONDS, 300);
        assert_eq!(DEFAULT_LOOKBACK_HOURS, 1);
    }
}
