//! Health classification derived from recent samples.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use integration_primitives::ServiceId;
use serde::{Deserialize, Serialize};

use crate::sample::MetricSample;

const UNHEALTHY_ERROR_RATE: f64 = 0.5;
const DEGRADED_ERROR_RATE: f64 = 0.1;

/// Health classification, ordered from best to worst.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// Error rate at or below 10%.
    #[default]
    Healthy,
    /// Error rate above 10% and at most 50%.
    Degraded,
    /// Error rate above 50%.
    Unhealthy,
}

impl HealthState {
    /// Classifies an error fraction in `[0, 1]`.
    #[must_use]
    pub fn from_error_rate(rate: f64) -> Self {
        if rate > UNHEALTHY_ERROR_RATE {
            Self::Unhealthy
        } else if rate > DEGRADED_ERROR_RATE {
            Self::Degraded
        } else {
            Self::Healthy
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        })
    }
}

/// Health of a single service within the window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// Classification.
    pub state: HealthState,
    /// Fraction of error-named samples.
    pub error_rate: f64,
    /// Samples considered.
    pub sample_count: usize,
}

/// Overall and per-service health.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Worst classification among services; healthy when none reported.
    pub overall: HealthState,
    /// Per-service classification.
    pub services: BTreeMap<ServiceId, ServiceHealth>,
    /// Instant the window ended at.
    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    pub(crate) fn evaluate<'a, I>(samples: I, checked_at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a MetricSample>,
    {
        let mut counts: BTreeMap<&ServiceId, (usize, usize)> = BTreeMap::new();
        for sample in samples {
            let entry = counts.entry(sample.service_id()).or_default();
            entry.0 += 1;
            if sample.is_error() {
                entry.1 += 1;
            }
        }

        let services: BTreeMap<ServiceId, ServiceHealth> = counts
            .into_iter()
            .map(|(service_id, (total, errors))| {
                let error_rate = ratio(errors, total);
                let health = ServiceHealth {
                    state: HealthState::from_error_rate(error_rate),
                    error_rate,
                    sample_count: total,
                };
                (service_id.clone(), health)
            })
            .collect();

        let overall = services
            .values()
            .map(|health| health.state)
            .max()
            .unwrap_or_default();

        Self {
            overall,
            services,
            checked_at,
        }
    }

    /// Returns the classification of one service, if it reported recently.
    #[must_use]
    pub fn service(&self, id: &ServiceId) -> Option<HealthState> {
        self.services.get(id).map(|health| health.state)
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
