//! Core shared types for the service integration runtime.

#![warn(missing_docs, clippy::pedantic)]

mod capability;
mod error;
mod ids;
mod value;

/// Capability identifiers advertised by services.
pub use capability::CapabilityId;
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Identifiers for services, events, subscriptions, and metric samples.
pub use ids::{EventId, SampleId, ServiceId, SubscriptionId};
/// Closed dynamic value model used for free-form payloads.
pub use value::{DynamicValue, Payload};
