//! Metric descriptors and GetMetricData query batching
//!
//! CloudWatch accepts at most 500 metrics per GetMetricData request, so the
//! full descriptor list from ListMetrics is split into batches here. Every
//! batch is fetched independently with the same parameters; overflow never
//! drops descriptors.

/// GetMetricData accepts at most 500 metric queries per request
pub const MAX_QUERIES_PER_BATCH: usize = 500;

/// One metric as returned by ListMetrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub namespace: String,
    pub metric_name: String,
    /// Ordered (name, value) dimension pairs
    pub dimensions: Vec<(String, String)>,
}

/// Statistic applied to each metric query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Average,
    Sum,
    Minimum,
    Maximum,
    SampleCount,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Average => "Average",
            Statistic::Sum => "Sum",
            Statistic::Minimum => "Minimum",
            Statistic::Maximum => "Maximum",
            Statistic::SampleCount => "SampleCount",
        }
    }
}

/// One GetMetricData query, valid for a single request batch
#[derive(Debug, Clone, PartialEq)]
pub struct MetricQuery {
    /// Synthetic identifier, unique within its batch ("m1", "m2", ...)
    pub id: String,
    pub descriptor: MetricDescriptor,
    pub period_seconds: i32,
    pub stat: Statistic,
}

/// Split descriptors into GetMetricData batches of at most
/// [`MAX_QUERIES_PER_BATCH`] queries each, preserving input order.
///
/// Ids restart at "m1" in every batch; they only need to be unique within
/// one request.
pub fn build_query_batches(
    descriptors: Vec<MetricDescriptor>,
    period_seconds: i32,
    stat: Statistic,
) -> Vec<Vec<MetricQuery>> {
    let mut batches = Vec::new();
    let mut current = Vec::new();

    for descriptor in descriptors {
        current.push(MetricQuery {
            id: format!("m{}", current.len() + 1),
            descriptor,
            period_seconds,
            stat,
        });

        if current.len() >= MAX_QUERIES_PER_BATCH {
            batches.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        batches.push(current);
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(n: usize) -> MetricDescriptor {
        MetricDescriptor {
            namespace: "AWS/EC2".to_string(),
            metric_name: "CPUUtilization".to_string(),
            dimensions: vec![("InstanceId".to_string(), format!("i-{n:05}"))],
        }
    }

    fn descriptors(count: usize) -> Vec<MetricDescriptor> {
        (0..count).map(descriptor).collect()
    }

    #[test]
    fn empty_input_produces_no_batches() {
        let batches = build_query_batches(vec![], 300, Statistic::Average);
        assert!(batches.is_empty());
    }

    #[test]
    fn small_input_fits_one_batch() {
        let batches = build_query_batches(descriptors(3), 300, Statistic::Average);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
        let ids: Vec<_> = batches[0].iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2", "m3"]);
    }

    #[test]
    fn exact_limit_fills_one_batch() {
        let batches = build_query_batches(descriptors(500), 300, Statistic::Average);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 500);
        assert_eq!(batches[0][499].id, "m500");
    }

    #[test]
    fn overflow_splits_without_dropping() {
        // 1250 descriptors => ceil(1250/500) = 3 batches of 500/500/250
        let input = descriptors(1250);
        let batches = build_query_batches(input.clone(), 300, Statistic::Average);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 500);
        assert_eq!(batches[1].len(), 500);
        assert_eq!(batches[2].len(), 250);

        // Round trip: flattening all batches recovers the input in order
        let recovered: Vec<_> = batches
            .iter()
            .flatten()
            .map(|q| q.descriptor.clone())
            .collect();
        assert_eq!(recovered, input);
    }

    #[test]
    fn ids_restart_per_batch() {
        let batches = build_query_batches(descriptors(501), 300, Statistic::Average);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0][0].id, "m1");
        assert_eq!(batches[1][0].id, "m1");
        assert_eq!(batches[1].len(), 1);
    }

    #[test]
    fn every_query_carries_period_and_stat() {
        let batches = build_query_batches(descriptors(750), 60, Statistic::Maximum);
        for query in batches.iter().flatten() {
            assert_eq!(query.period_seconds, 60);
            assert_eq!(query.stat, Statistic::Maximum);
        }
    }

    #[test]
    fn stat_names_match_cloudwatch() {
        assert_eq!(Statistic::Average.as_str(), "Average");
        assert_eq!(Statistic::SampleCount.as_str(), "SampleCount");
    }
}
