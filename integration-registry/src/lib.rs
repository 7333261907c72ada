//! Service catalog and discovery.
//!
//! [`ServiceRegistry`] stores [`ServiceDescriptor`]s keyed by [`ServiceId`]
//! behind a single lock, so concurrent readers always observe either the
//! state before or after a write.

#![warn(missing_docs, clippy::pedantic)]

mod descriptor;
mod registry;

pub use descriptor::{ServiceDescriptor, ServiceDescriptorBuilder};
pub use integration_primitives::{CapabilityId, ServiceId};
pub use registry::{RegistryError, RegistryResult, ServiceQuery, ServiceRegistry};
