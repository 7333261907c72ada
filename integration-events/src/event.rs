//! Event envelope published on the bus.

use std::fmt;

use chrono::{DateTime, Utc};
use integration_primitives::{DynamicValue, EventId, Payload};
use serde::{Deserialize, Serialize};

/// Closed set of event categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// A service was added to (or replaced in) the registry.
    ServiceRegistered,
    /// A service was removed from the registry.
    ServiceUnregistered,
    /// A tool invocation completed.
    ToolExecuted,
    /// An operation failed.
    ErrorOccurred,
    /// A service health probe completed.
    HealthChecked,
}

impl EventCategory {
    /// Returns the wire name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServiceRegistered => "service_registered",
            Self::ServiceUnregistered => "service_unregistered",
            Self::ToolExecuted => "tool_executed",
            Self::ErrorOccurred => "error_occurred",
            Self::HealthChecked => "health_checked",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal urgency of an event.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Something unexpected that did not fail the operation.
    Warning,
    /// An operation failed.
    Error,
    /// The system cannot continue normally.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        })
    }
}

/// Immutable event delivered to subscribers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    category: EventCategory,
    source: String,
    #[serde(default)]
    data: Payload,
    timestamp: DateTime<Utc>,
    severity: Severity,
}

impl Event {
    /// Starts building an event of the given category from the named source.
    #[must_use]
    pub fn builder(category: EventCategory, source: impl Into<String>) -> EventBuilder {
        EventBuilder {
            category,
            source: source.into(),
            data: Payload::new(),
            severity: Severity::default(),
            timestamp: None,
        }
    }

    /// Returns the event identifier.
    #[must_use]
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Returns the event category.
    #[must_use]
    pub const fn category(&self) -> EventCategory {
        self.category
    }

    /// Returns the name of the component that published the event.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the event payload.
    #[must_use]
    pub fn data(&self) -> &Payload {
        &self.data
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }
}

/// Builder for [`Event`].
#[derive(Debug)]
pub struct EventBuilder {
    category: EventCategory,
    source: String,
    data: Payload,
    severity: Severity,
    timestamp: Option<DateTime<Utc>>,
}

impl EventBuilder {
    /// Sets the severity; defaults to [`Severity::Info`].
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Adds a payload entry.
    #[must_use]
    pub fn data(mut self, key: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Overrides the timestamp; defaults to the time of [`build`](Self::build).
    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Finalises the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: EventId::random(),
            category: self.category,
            source: self.source,
            data: self.data,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            severity: self.severity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn builder_collects_payload() {
        let event = Event::builder(EventCategory::ToolExecuted, "integration-manager")
            .severity(Severity::Warning)
            .data("tool_id", "echo")
            .data("duration_ms", 12.5)
            .build();

        assert_eq!(event.category(), EventCategory::ToolExecuted);
        assert_eq!(event.severity(), Severity::Warning);
        assert_eq!(event.data()["tool_id"].as_str(), Some("echo"));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["category"], "tool_executed");
        assert_eq!(json["severity"], "warning");
    }
}
