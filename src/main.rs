//! org-metrics-export: export CloudWatch metrics for every account in an
//! AWS Organization to S3 as CSV.
//!
//! Intended to run on a schedule (external trigger); one invocation performs
//! one best-effort collection pass over the whole organization.

use anyhow::{Context, Result};
use clap::Parser;
use org_metrics_export::collector;
use org_metrics_export::config::{
    RunConfig, DEFAULT_LOOKBACK_HOURS, DEFAULT_PERIOD_SECONDS, DEFAULT_ROLE_NAME,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "org-metrics-export")]
#[command(about = "Export CloudWatch metrics for every account in an AWS Organization to S3")]
#[command(version)]
struct Args {
    /// Destination S3 bucket for the CSV exports
    #[arg(short, long, env = "METRICS_EXPORT_BUCKET")]
    bucket: String,

    /// Comma-separated regions to scan (empty means no collection)
    #[arg(short, long, env = "METRICS_EXPORT_REGIONS", default_value = "")]
    regions: String,

    /// Cross-account role assumed in every member account
    #[arg(long, default_value = DEFAULT_ROLE_NAME)]
    role_name: String,

    /// Region for Organizations/STS calls and the S3 uploads
    #[arg(long, default_value = "us-east-1")]
    home_region: String,

    /// Metric sampling period in seconds
    #[arg(long, default_value_t = DEFAULT_PERIOD_SECONDS)]
    period: i32,

    /// Collection window, in hours back from now
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_HOURS)]
    lookback_hours: i64,

    /// Write the run summary as JSON to this path
    #[arg(short, long)]
    output: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let regions: Vec<String> = args
        .regions
        .split(',')
        .map(str::trim)
        .filter(|region| !region.is_empty())
        .map(str::to_string)
        .collect();

    let config = RunConfig::new(
        args.bucket,
        regions,
        args.role_name,
        args.home_region,
        args.period,
        args.lookback_hours,
    );

    let summary = collector::run(config).await?;

    if !summary.skipped.is_empty() {
        warn!(
            authorization = summary.authorization_failures(),
            fetch = summary.fetch_failures(),
            sink = summary.sink_failures(),
            "Run finished with skipped units; see log for re-run context"
        );
    }

    if let Some(path) = args.output {
        let json = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize run summary")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write run summary to {path}"))?;
        info!(path = %path, "Wrote run summary");
    }

    Ok(())
}
