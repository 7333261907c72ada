//! Performance reports over a time range.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::health::ratio;
use crate::sample::{MetricSample, TimeRange};

const TREND_TOLERANCE: f64 = 0.05;
const BOTTLENECK_FACTOR: f64 = 2.0;

/// Direction a metric moved across the report range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Second-half average more than 5% below the first.
    Improving,
    /// Halves within 5% of each other.
    Stable,
    /// Second-half average more than 5% above the first.
    Degrading,
    /// Fewer than two samples.
    Unknown,
}

impl Trend {
    /// Classifies a series of values in temporal order.
    #[must_use]
    pub fn from_series(values: &[f64]) -> Self {
        if values.len() < 2 {
            return Self::Unknown;
        }

        let (first, second) = values.split_at(values.len() / 2);
        let first = mean(first);
        let second = mean(second);

        let tolerance = first.abs() * TREND_TOLERANCE;
        if second - first > tolerance {
            Self::Degrading
        } else if first - second > tolerance {
            Self::Improving
        } else {
            Self::Stable
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Degrading => "degrading",
            Self::Unknown => "unknown",
        })
    }
}

/// Aggregate of one metric name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Mean value.
    pub average: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Number of samples.
    pub count: usize,
    /// Direction across the range.
    pub trend: Trend,
    /// Peak exceeds twice a positive average.
    pub bottleneck: bool,
}

/// Totals across every sample in the range.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Samples in range.
    pub total_samples: usize,
    /// Samples counted as successful.
    pub successful: usize,
    /// Samples counted as failed.
    pub failed: usize,
    /// Mean sample value.
    pub average_latency: f64,
    /// Largest sample value.
    pub peak_latency: f64,
    /// Samples per second over the range.
    pub throughput: f64,
    /// `failed / total_samples`.
    pub error_rate: f64,
}

/// Performance view over a caller-supplied time range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Range the report covers.
    pub time_range: TimeRange,
    /// Per-metric aggregates keyed by metric name.
    pub metrics: BTreeMap<String, MetricSummary>,
    /// Metric names flagged as bottlenecks.
    pub bottlenecks: Vec<String>,
    /// Totals.
    pub summary: ReportSummary,
}

impl PerformanceReport {
    pub(crate) fn build<'a, I>(samples: I, time_range: TimeRange) -> Self
    where
        I: IntoIterator<Item = &'a MetricSample>,
    {
        let mut series: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        let mut summary = ReportSummary::default();
        let mut value_sum = 0.0;
        let mut peak: Option<f64> = None;

        for sample in samples {
            series.entry(sample.name()).or_default().push(sample.value());

            summary.total_samples += 1;
            if sample.counts_as_success() {
                summary.successful += 1;
            } else {
                summary.failed += 1;
            }
            value_sum += sample.value();
            peak = Some(peak.map_or(sample.value(), |current| current.max(sample.value())));
        }

        let metrics: BTreeMap<String, MetricSummary> = series
            .into_iter()
            .map(|(name, values)| (name.to_owned(), summarize(&values)))
            .collect();
        let bottlenecks = metrics
            .iter()
            .filter(|(_, metric)| metric.bottleneck)
            .map(|(name, _)| name.clone())
            .collect();

        if summary.total_samples > 0 {
            summary.average_latency = value_sum / count_f64(summary.total_samples);
            summary.peak_latency = peak.unwrap_or_default();
            summary.error_rate = ratio(summary.failed, summary.total_samples);
            let seconds = time_range.duration_secs();
            if seconds > 0.0 {
                summary.throughput = count_f64(summary.total_samples) / seconds;
            }
        }

        Self {
            time_range,
            metrics,
            bottlenecks,
            summary,
        }
    }
}

fn summarize(values: &[f64]) -> MetricSummary {
    let average = mean(values);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    MetricSummary {
        average,
        min,
        max,
        count: values.len(),
        trend: Trend::from_series(values),
        bottleneck: average > 0.0 && max > average * BOTTLENECK_FACTOR,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / count_f64(values.len())
    }
}

#[allow(clippy::cast_precision_loss)]
fn count_f64(count: usize) -> f64 {
    count as f64
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use integration_primitives::ServiceId;

    use super::*;

    fn samples(name: &str, values: &[f64]) -> Vec<MetricSample> {
        let service = ServiceId::new("svc").unwrap();
        values
            .iter()
            .map(|value| MetricSample::builder(service.clone(), name, *value).build())
            .collect()
    }

    #[test]
    fn trend_compares_halves() {
        assert_eq!(Trend::from_series(&[10.0, 10.0, 12.0, 12.0]), Trend::Degrading);
        assert_eq!(Trend::from_series(&[12.0, 12.0, 10.0, 10.0]), Trend::Improving);
        assert_eq!(Trend::from_series(&[10.0, 10.0, 10.0, 10.0]), Trend::Stable);
        assert_eq!(Trend::from_series(&[10.0, 10.4]), Trend::Stable);
        assert_eq!(Trend::from_series(&[10.0]), Trend::Unknown);
        assert_eq!(Trend::from_series(&[]), Trend::Unknown);
    }

    #[test]
    fn odd_series_puts_middle_value_in_second_half() {
        // first half [10], second half [10, 13] -> 11.5 > 10.5
        assert_eq!(Trend::from_series(&[10.0, 10.0, 13.0]), Trend::Degrading);
    }

    #[test]
    fn negative_series_use_magnitude_of_first_half() {
        assert_eq!(Trend::from_series(&[-10.0, -10.0, -10.0, -10.0]), Trend::Stable);
        assert_eq!(Trend::from_series(&[-10.0, -10.0, -10.2, -10.2]), Trend::Stable);
        assert_eq!(Trend::from_series(&[-10.0, -10.0, -5.0, -5.0]), Trend::Degrading);
        assert_eq!(Trend::from_series(&[-10.0, -10.0, -20.0, -20.0]), Trend::Improving);
        assert_eq!(Trend::from_series(&[0.0, 0.0, 0.0]), Trend::Stable);
    }

    #[test]
    fn constant_or_non_positive_series_is_not_a_bottleneck() {
        let flat = summarize(&[-5.0, -5.0, -5.0]);
        assert_eq!(flat.trend, Trend::Stable);
        assert!(!flat.bottleneck);

        assert!(!summarize(&[-4.0, 1.0]).bottleneck);
        assert!(!summarize(&[0.0, 0.0]).bottleneck);
        assert!(!summarize(&[7.0, 7.0, 7.0]).bottleneck);
    }

    #[test]
    fn summarizes_and_flags_bottlenecks() {
        let mut all = samples("execution_time", &[10.0, 10.0, 10.0, 50.0]);
        all.extend(samples("queue_depth", &[3.0, 3.0]));
        let range = TimeRange::trailing(Duration::seconds(10), Utc::now());

        let report = PerformanceReport::build(&all, range);

        let latency = &report.metrics["execution_time"];
        assert_eq!(latency.count, 4);
        assert!((latency.average - 20.0).abs() < f64::EPSILON);
        assert!((latency.min - 10.0).abs() < f64::EPSILON);
        assert!((latency.max - 50.0).abs() < f64::EPSILON);
        assert!(latency.bottleneck);
        assert_eq!(latency.trend, Trend::Degrading);
        assert_eq!(report.bottlenecks, vec!["execution_time".to_owned()]);
        assert!(!report.metrics["queue_depth"].bottleneck);

        assert_eq!(report.summary.total_samples, 6);
        assert_eq!(report.summary.successful, 6);
        assert!((report.summary.peak_latency - 50.0).abs() < f64::EPSILON);
        assert!((report.summary.throughput - 0.6).abs() < 1e-9);
        assert!(report.summary.error_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn failures_drive_error_rate() {
        let service = ServiceId::new("svc").unwrap();
        let all = vec![
            MetricSample::builder(service.clone(), "execution_time", 4.0)
                .success(true)
                .build(),
            MetricSample::builder(service.clone(), "execution_error", 4.0)
                .success(false)
                .build(),
            MetricSample::builder(service.clone(), "delta", -2.0).build(),
            MetricSample::builder(service, "delta", 2.0).build(),
        ];
        let range = TimeRange::trailing(Duration::seconds(1), Utc::now());

        let report = PerformanceReport::build(&all, range);
        assert_eq!(report.summary.failed, 2);
        assert_eq!(report.summary.successful, 2);
        assert!((report.summary.error_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_range_has_zeroed_summary() {
        let now = Utc::now();
        let report = PerformanceReport::build(&[], TimeRange::new(now, now).unwrap());
        assert!(report.metrics.is_empty());
        assert_eq!(report.summary, ReportSummary::default());
    }
}
