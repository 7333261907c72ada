//! Metric samples and time ranges.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use integration_primitives::{DynamicValue, Payload, SampleId, ServiceId};
use serde::{Deserialize, Serialize};

use crate::config::TelemetryError;

/// A single numeric observation owned by a service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    id: SampleId,
    service_id: ServiceId,
    name: String,
    value: f64,
    unit: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    tags: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
}

impl MetricSample {
    /// Starts building a sample for the service.
    #[must_use]
    pub fn builder(
        service_id: ServiceId,
        name: impl Into<String>,
        value: f64,
    ) -> MetricSampleBuilder {
        MetricSampleBuilder {
            service_id,
            name: name.into(),
            value,
            unit: String::new(),
            timestamp: None,
            tags: Payload::new(),
            success: None,
        }
    }

    /// Returns the sample identifier.
    #[must_use]
    pub const fn id(&self) -> SampleId {
        self.id
    }

    /// Returns the owning service.
    #[must_use]
    pub fn service_id(&self) -> &ServiceId {
        &self.service_id
    }

    /// Returns the metric name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the observed value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Returns the unit label.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Returns when the value was observed.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the free-form tags.
    #[must_use]
    pub fn tags(&self) -> &Payload {
        &self.tags
    }

    /// Returns the explicit outcome flag, when the recorder supplied one.
    #[must_use]
    pub const fn success(&self) -> Option<bool> {
        self.success
    }

    /// Whether the metric name denotes an error observation.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.name.to_ascii_lowercase().contains("error")
    }

    /// Outcome used by performance reports: the explicit flag if present,
    /// otherwise a non-negative value counts as success.
    #[must_use]
    pub fn counts_as_success(&self) -> bool {
        self.success.unwrap_or(self.value >= 0.0)
    }
}

/// Builder for [`MetricSample`].
#[derive(Debug)]
pub struct MetricSampleBuilder {
    service_id: ServiceId,
    name: String,
    value: f64,
    unit: String,
    timestamp: Option<DateTime<Utc>>,
    tags: Payload,
    success: Option<bool>,
}

impl MetricSampleBuilder {
    /// Sets the unit label (e.g. `ms`).
    #[must_use]
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Overrides the observation time; defaults to the time of [`build`](Self::build).
    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Records an explicit outcome for the observation.
    #[must_use]
    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    /// Finalises the sample.
    #[must_use]
    pub fn build(self) -> MetricSample {
        MetricSample {
            id: SampleId::random(),
            service_id: self.service_id,
            name: self.name,
            value: self.value,
            unit: self.unit,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            tags: self.tags,
            success: self.success,
        }
    }
}

/// Inclusive time interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Creates a range from `start` to `end`.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidTimeRange`] if `end` precedes `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TelemetryError> {
        if end < start {
            return Err(TelemetryError::InvalidTimeRange);
        }
        Ok(Self { start, end })
    }

    /// Range covering the trailing `window` up to `end`.
    #[must_use]
    pub fn trailing(window: ChronoDuration, end: DateTime<Utc>) -> Self {
        let window = window.max(ChronoDuration::zero());
        Self {
            start: end
                .checked_sub_signed(window)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end,
        }
    }

    /// Returns the start of the range.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the end of the range.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether the instant lies within the range, bounds included.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Length of the range in fractional seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f64 {
        let span = self.end - self.start;
        span.num_milliseconds() as f64 / 1000.0
    }
}
