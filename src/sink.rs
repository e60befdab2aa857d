//! CSV serialization and S3 upload
//!
//! One CSV object per collection unit, overwritten on re-runs. Serialization
//! is deterministic for a fixed record sequence so re-runs over the same
//! window produce byte-identical objects.

use crate::aws::S3Client;
use crate::flatten::FlatRecord;
use anyhow::{Context, Result};
use tracing::info;

/// Fixed leading columns; label parts follow as extra columns per row
const HEADER: [&str; 5] = ["account_id", "region", "timestamp", "value", "label"];

/// Serialize records to CSV bytes with a header row.
///
/// Rows carry a variable number of trailing label columns, so the writer
/// runs in flexible mode.
pub fn render_csv(records: &[FlatRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .context("Failed to write CSV header")?;

    for record in records {
        let mut row = vec![
            record.account_id.clone(),
            record.region.clone(),
            record.timestamp.to_rfc3339(),
            record.value.to_string(),
        ];
        row.extend(record.label_parts.iter().cloned());

        writer.write_record(&row).context("Failed to write CSV row")?;
    }

    writer
        .into_inner()
        .map_err(|error| anyhow::anyhow!("Failed to flush CSV writer: {error}"))
}

/// Writes flattened records as CSV objects to the export bucket
pub struct CsvSink {
    s3: S3Client,
    bucket: String,
}

impl CsvSink {
    pub fn new(s3: S3Client, bucket: String) -> Self {
        Self { s3, bucket }
    }

    /// Serialize `records` and overwrite the object at `key`.
    ///
    /// Upload failures surface to the caller; there is no retry here since a
    /// failed put usually means a persistent bucket or permission problem.
    pub async fn write(&self, key: &str, records: &[FlatRecord]) -> Result<()> {
        let body = render_csv(records)?;

        self.s3
            .put_object(&self.bucket, key, body, "text/csv")
            .await
            .with_context(|| format!("Failed to write s3://{}/{}", self.bucket, key))?;

        info!(bucket = %self.bucket, key = %key, rows = records.len(), "Wrote CSV object");

        Ok(())
    }
}
