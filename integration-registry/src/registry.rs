//! Concurrency-safe service catalog.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use integration_primitives::{CapabilityId, ServiceId};
use thiserror::Error;
use tracing::{debug, info};

use crate::descriptor::ServiceDescriptor;

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors produced while building or registering service descriptors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The descriptor failed validation.
    #[error("invalid descriptor for service `{id}`: {reason}")]
    InvalidDescriptor {
        /// Service the descriptor was built for.
        id: ServiceId,
        /// Human-readable reason for rejection.
        reason: String,
    },
}

impl RegistryError {
    /// Convenience constructor for descriptor validation failures.
    #[must_use]
    pub fn invalid_descriptor(id: &ServiceId, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            id: id.clone(),
            reason: reason.into(),
        }
    }
}

/// Filter accepted by [`ServiceRegistry::find_services`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceQuery {
    /// Every registered service.
    All,
    /// The service with the given identifier, if any.
    ById(ServiceId),
    /// Services declaring the capability.
    ByCapability(CapabilityId),
    /// Services whose display name contains the text, ignoring ASCII case.
    ByName(String),
}

/// Registry of service descriptors keyed by identifier.
#[derive(Default)]
pub struct ServiceRegistry {
    inner: RwLock<HashMap<ServiceId, ServiceDescriptor>>,
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.read();
        let mut ids: Vec<_> = inner.keys().map(ServiceId::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("ServiceRegistry")
            .field("registered", &ids)
            .finish()
    }
}

impl ServiceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the descriptor, replacing any previous one with the same id.
    ///
    /// Returns the replaced descriptor.
    pub fn register(&self, descriptor: ServiceDescriptor) -> Option<ServiceDescriptor> {
        let id = descriptor.id().clone();
        let previous = self.write().insert(id.clone(), descriptor);
        if previous.is_some() {
            info!(service_id = %id, "service re-registered");
        } else {
            info!(service_id = %id, "service registered");
        }
        previous
    }

    /// Removes the service; unknown ids are ignored.
    pub fn unregister(&self, id: &ServiceId) -> Option<ServiceDescriptor> {
        let removed = self.write().remove(id);
        match &removed {
            Some(_) => info!(service_id = %id, "service unregistered"),
            None => debug!(service_id = %id, "unregister ignored for unknown service"),
        }
        removed
    }

    /// Returns a snapshot of every descriptor, ordered by id.
    #[must_use]
    pub fn discover_all(&self) -> Vec<ServiceDescriptor> {
        self.collect_sorted(|_| true)
    }

    /// Returns the descriptor registered under the id.
    #[must_use]
    pub fn find_by_id(&self, id: &ServiceId) -> Option<ServiceDescriptor> {
        self.read().get(id).cloned()
    }

    /// Returns every descriptor that declares the capability, ordered by id.
    #[must_use]
    pub fn find_by_capability(&self, capability: &CapabilityId) -> Vec<ServiceDescriptor> {
        self.collect_sorted(|descriptor| descriptor.has_capability(capability))
    }

    /// Evaluates a [`ServiceQuery`].
    #[must_use]
    pub fn find_services(&self, query: &ServiceQuery) -> Vec<ServiceDescriptor> {
        match query {
            ServiceQuery::All => self.discover_all(),
            ServiceQuery::ById(id) => self.find_by_id(id).into_iter().collect(),
            ServiceQuery::ByCapability(capability) => self.find_by_capability(capability),
            ServiceQuery::ByName(text) => {
                let needle = text.to_ascii_lowercase();
                self.collect_sorted(|descriptor| {
                    descriptor.name().to_ascii_lowercase().contains(&needle)
                })
            }
        }
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` when no service is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn collect_sorted<F>(&self, predicate: F) -> Vec<ServiceDescriptor>
    where
        F: Fn(&ServiceDescriptor) -> bool,
    {
        let mut matches: Vec<_> = self
            .read()
            .values()
            .filter(|descriptor| predicate(descriptor))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.id().cmp(b.id()));
        matches
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ServiceId, ServiceDescriptor>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ServiceId, ServiceDescriptor>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
