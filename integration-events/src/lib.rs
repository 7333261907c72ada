//! In-memory typed publish/subscribe.
//!
//! Subscribers register an [`EventHandler`] for one [`EventCategory`] and
//! receive every [`Event`] of that category published on the [`EventBus`]
//! until they unsubscribe. Publishing is fire-and-forget: handler failures
//! and panics are logged and never reach the publisher.

#![warn(missing_docs, clippy::pedantic)]

mod bus;
mod event;

pub use bus::{EventBus, EventHandler, HandlerError, HandlerResult, Subscription};
pub use event::{Event, EventBuilder, EventCategory, Severity};
pub use integration_primitives::{DynamicValue, EventId, Payload, SubscriptionId};
