//! Static catalog of metrics collected for every account and region
//!
//! Each entry is one unit of collection work: a ListMetrics filter plus the
//! output filename stem. Adding a metric to the export means adding a row
//! here; no other code changes.

/// One metric-collection declaration
#[derive(Debug, Clone, Copy)]
pub struct CollectionTask {
    /// CloudWatch metric namespace
    pub namespace: &'static str,

    /// Metric name to collect; `None` collects every metric in the namespace
    pub metric_name: Option<&'static str>,

    /// Dimension names used to filter ListMetrics (values unconstrained)
    pub dimension_names: &'static [&'static str],

    /// Output filename stem, unique within the namespace
    pub filename: &'static str,
}

impl CollectionTask {
    /// S3 object key for this task's output for one account and region.
    ///
    /// Keys are disjoint across (account, region, task) so no two collection
    /// units ever write to the same object.
    pub fn object_key(&self, account_id: &str, region: &str) -> String {
        format!(
            "{}/{}/{}/{}.csv",
            self.namespace, account_id, region, self.filename
        )
    }
}

/// Metrics collected per account and region, one CSV object per entry
pub const CATALOG: &[CollectionTask] = &[
    CollectionTask {
        namespace: "AWS/EC2",
        metric_name: Some("CPUUtilization"),
        dimension_names: &["InstanceId"],
        filename: "EC2_CPUUtilization",
    },
    CollectionTask {
        namespace: "AWS/EC2",
        metric_name: Some("NetworkIn"),
        dimension_names: &["InstanceId"],
        filename: "EC2_NetworkIn",
    },
    CollectionTask {
        namespace: "AWS/EC2",
        metric_name: Some("NetworkOut"),
        dimension_names: &["InstanceId"],
        filename: "EC2_NetworkOut",
    },
    // Everything published under ContainerInsights, no filter
    CollectionTask {
        namespace: "ContainerInsights",
        metric_name: None,
        dimension_names: &[],
        filename: "ContainerInsights",
    },
    CollectionTask {
        namespace: "AWS/DX",
        metric_name: Some("ConnectionState"),
        dimension_names: &["ConnectionId"],
        filename: "DX_ConnectionState",
    },
    CollectionTask {
        namespace: "AWS/S3",
        metric_name: Some("AllRequests"),
        dimension_names: &["BucketName", "StorageType"],
        filename: "S3_AllRequests",
    },
    CollectionTask {
        namespace: "AWS/DynamoDB",
        metric_name: Some("ProvisionedReadCapacityUnits"),
        dimension_names: &["TableName"],
        filename: "ProvisionedReadCapacityUnits",
    },
    CollectionTask {
        namespace: "AWS/DynamoDB",
        metric_name: Some("AccountProvisionedWriteCapacityUtilization"),
        dimension_names: &["TableName"],
        filename: "AccountProvisionedWriteCapacityUtilization",
    },
    CollectionTask {
        namespace: "AWS/DynamoDB",
        metric_name: Some("ConsumedReadCapacityUnits"),
        dimension_names: &["TableName"],
        filename: "ConsumedReadCapacityUnits",
    },
    CollectionTask {
        namespace: "AWS/DynamoDB",
        metric_name: Some("ConsumedWriteCapacityUnits"),
        dimension_names: &["TableName"],
        filename: "ConsumedWriteCapacityUnits",
    },
    // Number of WorkSpaces with a user connected
    CollectionTask {
        namespace: "AWS/WorkSpaces",
        metric_name: Some("UserConnected"),
        dimension_names: &["DirectoryId"],
        filename: "UserConnected",
    },
];
