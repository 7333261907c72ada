//! Subscription registry and synchronous fan-out.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use integration_primitives::SubscriptionId;
use thiserror::Error;
use tracing::{debug, warn};

use crate::event::{Event, EventCategory};

/// Error returned by a failing [`EventHandler`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler-specific failure with human-readable context.
    #[error("event handler failed: {0}")]
    Failed(String),
}

impl HandlerError {
    /// Creates a failure from a string-like value.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Result alias for event handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Callback invoked for every matching event.
///
/// Handlers run on the publisher's task, possibly concurrently with each
/// other, and must not block for long.
pub trait EventHandler: Send + Sync {
    /// Handles a single event.
    ///
    /// # Errors
    ///
    /// Errors are logged by the bus and otherwise ignored.
    fn handle(&self, event: &Event) -> HandlerResult;
}

impl<F> EventHandler for F
where
    F: Fn(&Event) -> HandlerResult + Send + Sync,
{
    fn handle(&self, event: &Event) -> HandlerResult {
        (self)(event)
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    category: EventCategory,
    handler: Arc<dyn EventHandler>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl Subscription {
    /// Returns the subscription identifier.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the category this subscription listens for.
    #[must_use]
    pub const fn category(&self) -> EventCategory {
        self.category
    }
}

/// In-memory publish/subscribe bus.
#[derive(Default)]
pub struct EventBus {
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

impl EventBus {
    /// Creates a bus with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for the category.
    pub fn subscribe<H>(&self, category: EventCategory, handler: H) -> Subscription
    where
        H: EventHandler + 'static,
    {
        self.subscribe_shared(category, Arc::new(handler))
    }

    /// Registers an already shared handler for the category.
    pub fn subscribe_shared(
        &self,
        category: EventCategory,
        handler: Arc<dyn EventHandler>,
    ) -> Subscription {
        let subscription = Subscription {
            id: SubscriptionId::random(),
            category,
            handler,
        };
        self.write().insert(subscription.id, subscription.clone());
        debug!(subscription_id = %subscription.id, %category, "subscribed");
        subscription
    }

    /// Removes the subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let removed = self.write().remove(&subscription.id).is_some();
        debug!(subscription_id = %subscription.id, removed, "unsubscribed");
        removed
    }

    /// Delivers the event to every subscription of its category.
    ///
    /// Handlers run after the subscription lock is released, each one
    /// isolated from the others' errors and panics. Returns the number of
    /// handlers invoked.
    pub fn publish(&self, event: Event) -> usize {
        let category = event.category();
        let targets: Vec<Subscription> = self
            .read()
            .values()
            .filter(|subscription| subscription.category == category)
            .cloned()
            .collect();

        for subscription in &targets {
            let outcome = catch_unwind(AssertUnwindSafe(|| subscription.handler.handle(&event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(subscription_id = %subscription.id, %category, %err, "event handler failed");
                }
                Err(_) => {
                    warn!(subscription_id = %subscription.id, %category, "event handler panicked");
                }
            }
        }

        debug!(event_id = %event.id(), %category, delivered = targets.len(), "event published");
        targets.len()
    }

    /// Returns the number of active subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SubscriptionId, Subscription>> {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SubscriptionId, Subscription>> {
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
