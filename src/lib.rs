//! org-metrics-export: organization-wide CloudWatch metric export
//!
//! For every active account in an AWS Organization this crate assumes a
//! cross-account role, pulls a fixed catalog of CloudWatch metrics for each
//! configured region, flattens the results into CSV rows, and uploads one CSV
//! object per collection unit to S3.

pub mod aws;
pub mod catalog;
pub mod collector;
pub mod config;
pub mod flatten;
pub mod query;
pub mod retry;
pub mod sink;
