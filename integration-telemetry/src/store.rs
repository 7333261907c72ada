//! Bounded in-memory metrics series.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use integration_primitives::ServiceId;
use tracing::trace;

use crate::config::MetricsConfig;
use crate::health::HealthStatus;
use crate::report::PerformanceReport;
use crate::sample::{MetricSample, TimeRange};

/// Ring of the most recent samples across all services.
#[derive(Debug)]
pub struct MetricsStore {
    config: MetricsConfig,
    entries: RwLock<VecDeque<MetricSample>>,
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

impl MetricsStore {
    /// Creates an empty store using the supplied configuration.
    #[must_use]
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(VecDeque::with_capacity(config.capacity().get())),
        }
    }

    /// Returns the configuration the store was created with.
    #[must_use]
    pub const fn config(&self) -> MetricsConfig {
        self.config
    }

    /// Appends a sample, evicting the oldest entries once capacity is exceeded.
    pub fn record_metric(&self, sample: MetricSample) {
        let mut guard = self.write();
        trace!(
            service_id = %sample.service_id(),
            metric = sample.name(),
            value = sample.value(),
            "metric recorded"
        );
        guard.push_back(sample);

        let capacity = self.config.capacity().get();
        while guard.len() > capacity {
            guard.pop_front();
        }
    }

    /// Returns the service's samples whose timestamps fall within the range,
    /// in insertion order.
    #[must_use]
    pub fn get_metrics(&self, service_id: &ServiceId, range: &TimeRange) -> Vec<MetricSample> {
        self.read()
            .iter()
            .filter(|sample| {
                sample.service_id() == service_id && range.contains(sample.timestamp())
            })
            .cloned()
            .collect()
    }

    /// Classifies every service that reported within the health window
    /// ending now.
    #[must_use]
    pub fn get_health_status(&self) -> HealthStatus {
        self.health_status_at(Utc::now())
    }

    /// Classifies every service that reported within the health window
    /// ending at `now`.
    #[must_use]
    pub fn health_status_at(&self, now: DateTime<Utc>) -> HealthStatus {
        let window = ChronoDuration::from_std(self.config.health_window())
            .unwrap_or_else(|_| ChronoDuration::weeks(52 * 100));
        let range = TimeRange::trailing(window, now);
        let guard = self.read();
        HealthStatus::evaluate(
            guard.iter().filter(|sample| range.contains(sample.timestamp())),
            now,
        )
    }

    /// Builds a performance report over every sample in the range.
    #[must_use]
    pub fn get_performance_report(&self, range: &TimeRange) -> PerformanceReport {
        let guard = self.read();
        PerformanceReport::build(
            guard.iter().filter(|sample| range.contains(sample.timestamp())),
            *range,
        )
    }

    /// Returns statistics about buffer utilisation.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.read().len(),
            capacity: self.config.capacity().get(),
        }
    }

    /// Drops every retained sample.
    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, VecDeque<MetricSample>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<MetricSample>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Snapshot describing utilisation of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Samples currently retained.
    pub entries: usize,
    /// Maximum number of samples retained.
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::health::HealthState;

    fn service(id: &str) -> ServiceId {
        ServiceId::new(id).unwrap()
    }

    fn sample_at(id: &str, name: &str, value: f64, at: DateTime<Utc>) -> MetricSample {
        MetricSample::builder(service(id), name, value)
            .timestamp(at)
            .build()
    }

    fn record_mix(store: &MetricsStore, id: &str, ok: usize, errors: usize, at: DateTime<Utc>) {
        for _ in 0..ok {
            store.record_metric(sample_at(id, "execution_time", 10.0, at));
        }
        for _ in 0..errors {
            store.record_metric(sample_at(id, "execution_error", 10.0, at));
        }
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let store = MetricsStore::default();
        let start = Utc::now() - ChronoDuration::hours(1);
        for i in 0..1001 {
            let at = start + ChronoDuration::milliseconds(i);
            #[allow(clippy::cast_precision_loss)]
            store.record_metric(sample_at("svc", "execution_time", i as f64, at));
        }

        assert_eq!(
            store.stats(),
            StoreStats {
                entries: 1000,
                capacity: 1000
            }
        );
        let range = TimeRange::trailing(ChronoDuration::days(1), Utc::now());
        let all = store.get_metrics(&service("svc"), &range);
        assert_eq!(all.len(), 1000);
        assert!((all[0].value() - 1.0).abs() < f64::EPSILON);
        assert!((all[999].value() - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn filters_by_service_and_range() {
        let store = MetricsStore::default();
        let now = Utc::now();
        let stale = now - ChronoDuration::minutes(10);
        store.record_metric(sample_at("a", "execution_time", 1.0, stale));
        store.record_metric(sample_at("a", "execution_time", 2.0, now));
        store.record_metric(sample_at("b", "execution_time", 3.0, now));

        let range = TimeRange::trailing(ChronoDuration::minutes(1), now);
        let found = store.get_metrics(&service("a"), &range);
        assert_eq!(found.len(), 1);
        assert!((found[0].value() - 2.0).abs() < f64::EPSILON);
        assert!(store.get_metrics(&service("c"), &range).is_empty());
    }

    #[test]
    fn classifies_by_error_rate() {
        let store = MetricsStore::default();
        let now = Utc::now();
        record_mix(&store, "calm", 10, 0, now);
        record_mix(&store, "shaky", 6, 4, now);
        record_mix(&store, "down", 4, 6, now);

        let status = store.health_status_at(now);
        assert_eq!(status.service(&service("calm")), Some(HealthState::Healthy));
        assert_eq!(status.service(&service("shaky")), Some(HealthState::Degraded));
        assert_eq!(status.service(&service("down")), Some(HealthState::Unhealthy));
        assert_eq!(status.overall, HealthState::Unhealthy);
    }

    #[test]
    fn health_ignores_samples_outside_window() {
        let store = MetricsStore::default();
        let now = Utc::now();
        record_mix(&store, "svc", 0, 5, now - ChronoDuration::minutes(6));
        record_mix(&store, "svc", 5, 0, now - ChronoDuration::minutes(1));

        let status = store.health_status_at(now);
        assert_eq!(status.overall, HealthState::Healthy);
        assert_eq!(status.services[&service("svc")].sample_count, 5);
    }

    #[test]
    fn custom_window_narrows_health() {
        let config = MetricsConfig::new(NonZeroUsize::new(10).unwrap())
            .with_health_window(Duration::from_secs(30))
            .unwrap();
        let store = MetricsStore::new(config);
        let now = Utc::now();
        record_mix(&store, "svc", 0, 3, now - ChronoDuration::minutes(1));

        assert!(store.health_status_at(now).services.is_empty());
    }

    #[test]
    fn empty_store_is_healthy() {
        let store = MetricsStore::default();
        let status = store.get_health_status();
        assert_eq!(status.overall, HealthState::Healthy);
        assert!(status.services.is_empty());
    }

    #[test]
    fn report_covers_range_only() {
        let store = MetricsStore::default();
        let now = Utc::now();
        let stale = now - ChronoDuration::hours(2);
        store.record_metric(sample_at("svc", "execution_time", 100.0, stale));
        record_mix(&store, "svc", 3, 1, now);

        let report =
            store.get_performance_report(&TimeRange::trailing(ChronoDuration::minutes(5), now));
        assert_eq!(report.summary.total_samples, 4);
        assert_eq!(report.metrics["execution_time"].count, 3);
        assert!(report.metrics.contains_key("execution_error"));
    }

    #[test]
    fn clear_empties_store() {
        let store = MetricsStore::default();
        record_mix(&store, "svc", 2, 0, Utc::now());
        store.clear();
        assert_eq!(store.stats().entries, 0);
    }

    #[tokio::test]
    async fn concurrent_recorders_respect_capacity() {
        let config = MetricsConfig::new(NonZeroUsize::new(50).unwrap());
        let store = Arc::new(MetricsStore::new(config));

        let mut handles = Vec::new();
        for task in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    let value = f64::from(task * 100 + i);
                    store.record_metric(
                        MetricSample::builder(service("svc"), "execution_time", value).build(),
                    );
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.stats().entries, 50);
    }
}
