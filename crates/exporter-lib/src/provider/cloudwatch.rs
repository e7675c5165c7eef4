//! Telemetry samples backed by the CloudWatch `GetMetricData` API

use super::{async_trait, FetchError, Result, SampleFetcher};
use crate::models::{MetricSample, SampleQuery};
use aws_sdk_cloudwatch::error::DisplayErrorContext;
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{Dimension, Metric, MetricDataQuery, MetricStat};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const QUERY_ID: &str = "m1";

pub struct CloudWatchSampleFetcher {
    client: aws_sdk_cloudwatch::Client,
}

impl CloudWatchSampleFetcher {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_cloudwatch::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl SampleFetcher for CloudWatchSampleFetcher {
    async fn fetch_sample(&self, instance: &str, query: &SampleQuery) -> Result<MetricSample> {
        let (start, end) = query_window(SystemTime::now(), query.lookback);

        let output = self
            .client
            .get_metric_data()
            .start_time(DateTime::from(start))
            .end_time(DateTime::from(end))
            .metric_data_queries(build_query(instance, query)?)
            .send()
            .await
            .map_err(|e| FetchError::Sample {
                instance: instance.to_string(),
                message: DisplayErrorContext(e).to_string(),
            })?;

        // Only the first result is consulted; there is exactly one query
        let datapoints = output
            .metric_data_results()
            .first()
            .map(|result| result.values().to_vec())
            .unwrap_or_default();

        Ok(MetricSample {
            instance: instance.to_string(),
            datapoints,
        })
    }
}

fn build_query(instance: &str, query: &SampleQuery) -> Result<MetricDataQuery> {
    let period = i32::try_from(query.period.as_secs())
        .map_err(|_| FetchError::Request(format!("period too large: {:?}", query.period)))?;

    let dimension = Dimension::builder()
        .name(&query.dimension_name)
        .value(instance)
        .build();

    let metric = Metric::builder()
        .namespace(&query.namespace)
        .metric_name(&query.metric_name)
        .dimensions(dimension)
        .build();

    let stat = MetricStat::builder()
        .metric(metric)
        .period(period)
        .stat(&query.statistic)
        .build();

    Ok(MetricDataQuery::builder()
        .id(QUERY_ID)
        .metric_stat(stat)
        .build())
}

/// Trailing window `[now - lookback, now]`, never starting before the epoch
fn query_window(now: SystemTime, lookback: Duration) -> (SystemTime, SystemTime) {
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    let start = now - lookback.min(since_epoch);
    (start, now)
}
