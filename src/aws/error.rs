//! AWS error classification
//!
//! Provides typed error categories for AWS SDK operations using the
//! `.code()` method instead of string matching on Debug format. The
//! collector uses these to decide between retrying (throttling) and
//! skipping a unit of work.

use thiserror::Error;

/// AWS error categories for retry and skip decisions
#[derive(Debug, Error)]
pub enum AwsError {
    /// Credentials lack permission for the operation (skip the unit)
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Rate limit exceeded (retryable with backoff)
    #[error("Rate limit exceeded")]
    Throttled,

    /// Target resource does not exist (skip the unit)
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this error is transient and worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, AwsError::Throttled)
    }

    /// Check if this is a permission failure
    pub fn is_access_denied(&self) -> bool {
        matches!(self, AwsError::AccessDenied { .. })
    }
}

/// Known AWS error codes for permission failures
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

/// Known AWS error codes for missing resources
const NOT_FOUND_CODES: &[&str] = &[
    "NoSuchBucket",
    "NoSuchKey",
    "ResourceNotFound",
    "ResourceNotFoundException",
    "AccountNotFoundException",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied { message },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an error from an anyhow::Error by extracting the AWS error code.
///
/// Walks the error chain using `ProvideErrorMetadata` to extract `.code()`
/// and `.message()` from the SDK operation errors this crate issues. Falls
/// back to string matching on the Debug representation if no typed error is
/// found.
pub fn classify_anyhow_error(error: &anyhow::Error) -> AwsError {
    use aws_sdk_cloudwatch::error::ProvideErrorMetadata;

    for cause in error.chain() {
        // CloudWatch operation errors
        if let Some(e) = cause.downcast_ref::<aws_sdk_cloudwatch::error::SdkError<
            aws_sdk_cloudwatch::operation::list_metrics::ListMetricsError,
        >>() {
            let meta = ProvideErrorMetadata::meta(e);
            return classify_aws_error(meta.code(), meta.message());
        }
        if let Some(e) = cause.downcast_ref::<aws_sdk_cloudwatch::error::SdkError<
            aws_sdk_cloudwatch::operation::get_metric_data::GetMetricDataError,
        >>() {
            let meta = ProvideErrorMetadata::meta(e);
            return classify_aws_error(meta.code(), meta.message());
        }
        // Organizations operation errors
        if let Some(e) = cause.downcast_ref::<aws_sdk_organizations::error::SdkError<
            aws_sdk_organizations::operation::list_accounts::ListAccountsError,
        >>() {
            let meta = ProvideErrorMetadata::meta(e);
            return classify_aws_error(meta.code(), meta.message());
        }
        // STS operation errors
        if let Some(e) = cause.downcast_ref::<aws_sdk_sts::error::SdkError<
            aws_sdk_sts::operation::assume_role::AssumeRoleError,
        >>() {
            let meta = ProvideErrorMetadata::meta(e);
            return classify_aws_error(meta.code(), meta.message());
        }
        // S3 operation errors
        if let Some(e) = cause.downcast_ref::<aws_sdk_s3::error::SdkError<
            aws_sdk_s3::operation::put_object::PutObjectError,
        >>() {
            let meta = ProvideErrorMetadata::meta(e);
            return classify_aws_error(meta.code(), meta.message());
        }
    }

    // Fallback: extract error code from debug string representation
    let debug_str = format!("{:?}", error);
    if let Some(code) = extract_error_code(&debug_str) {
        return classify_aws_error(Some(&code), Some(&debug_str));
    }

    AwsError::Sdk {
        code: None,
        message: error.to_string(),
    }
}

/// All known AWS error codes for extraction from debug strings (flat list)
const ALL_KNOWN_CODES: &[&str] = &[
    // Access denied
    "AccessDeniedException",
    "AccessDenied",
    "UnauthorizedOperation",
    // Throttling
    "ThrottlingException",
    "Throttling",
    "RequestLimitExceeded",
    "TooManyRequestsException",
    // Not found
    "NoSuchBucket",
    "NoSuchKey",
    "ResourceNotFoundException",
    "ResourceNotFound",
    "AccountNotFoundException",
];

/// Extract an AWS error code from a debug string representation
fn extract_error_code(debug_str: &str) -> Option<String> {
    for code in ALL_KNOWN_CODES {
        if debug_str.contains(code) {
            return Some((*code).to_string());
        }
    }

    // Try to extract any code from `code: Some("...")` pattern
    if let Some(start) = debug_str.find("code: Some(\"") {
        let rest = &debug_str[start + 12..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_codes() {
        for code in ACCESS_DENIED_CODES {
            let err = classify_aws_error(Some(code), Some("not allowed"));
            assert!(err.is_access_denied(), "Expected AccessDenied for code: {code}");
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(err.is_retryable(), "Expected retryable for code: {code}");
            assert!(matches!(err, AwsError::Throttled));
        }
    }

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("gone"));
            assert!(matches!(err, AwsError::NotFound { .. }));
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { .. }));

        let err2 = classify_aws_error(None, Some("something failed"));
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
    }

    #[test]
    fn extract_known_codes_from_debug_string() {
        for code in ALL_KNOWN_CODES {
            let debug_str = format!("SdkError {{ code: Some(\"{code}\"), message: \"fail\" }}");
            let extracted = extract_error_code(&debug_str);
            assert!(
                extracted.is_some(),
                "Failed to extract any code from string containing: {code}"
            );
        }
    }

    #[test]
    fn extract_code_from_code_field() {
        let debug_str = r#"SdkError { code: Some("SomeRandomCode"), message: "fail" }"#;
        assert_eq!(
            extract_error_code(debug_str).as_deref(),
            Some("SomeRandomCode")
        );
    }

    #[test]
    fn extract_none_from_unrelated_string() {
        assert!(extract_error_code("connection refused").is_none());
    }

    #[test]
    fn classify_anyhow_falls_back_to_debug_string() {
        let err = anyhow::anyhow!("ThrottlingException: rate exceeded");
        assert!(classify_anyhow_error(&err).is_retryable());

        let err = anyhow::anyhow!("AccessDenied: no");
        assert!(classify_anyhow_error(&err).is_access_denied());

        let err = anyhow::anyhow!("connection refused");
        assert!(matches!(classify_anyhow_error(&err), AwsError::Sdk { code: None, .. }));
    }
}
