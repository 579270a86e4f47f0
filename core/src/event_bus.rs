//! Event bus abstraction for cross-module communication.
//!
//! This module provides the [`EventBus`] trait for publishing and subscribing to
//! lifecycle events across independently deployed modules. The session coordinator
//! publishes to it; UI modules subscribe to it and never talk to the coordinator directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  SessionStore   │
//! │  (sign-in, ...) │
//! └────────┬────────┘
//!          │ publish("auth-events", USER_LOGGED_IN)
//!          ▼
//! ┌─────────────────┐
//! │    Event Bus    │◄─── Fan-out, best-effort
//! └────────┬────────┘
//!          │
//!     ┌────┴────┐
//!     │         │
//!     ▼         ▼
//! ┌───────┐ ┌───────┐
//! │ Nav   │ │ Cart  │
//! │module │ │module │
//! └───────┘ └───────┘
//! ```
//!
//! # Implementations
//!
//! - `InMemoryEventBus` in `auth-session-testing` - records everything, for tests
//! - Host applications plug in whatever transport their modules already share
//!
//! # Example
//!
//! ```rust,ignore
//! use auth_session_core::event::SerializedEvent;
//! use futures::StreamExt;
//!
//! let mut stream = event_bus.subscribe(&["auth-events"]).await?;
//! while let Some(result) = stream.next().await {
//!     match result {
//!         Ok(event) if event.event_type == "USER_LOGGED_OUT" => clear_cart(),
//!         Ok(_) => {}
//!         Err(e) => tracing::warn!(error = %e, "auth event stream error"),
//!     }
//! }
//! ```

use crate::event::SerializedEvent;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to publish an event to a topic
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed
        topic: String,
        /// The reason for failure
        reason: String,
    },

    /// Failed to subscribe to topics
    #[error("Subscription failed for topics {topics:?}: {reason}")]
    SubscriptionFailed {
        /// The topics that failed to subscribe
        topics: Vec<String>,
        /// The reason for failure
        reason: String,
    },

    /// Network or transport error
    #[error("Transport error: {0}")]
    TransportError(String),
}

/// Stream of events from subscriptions.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<SerializedEvent, EventBusError>> + Send>>;

/// Trait for event bus implementations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`; the coordinator publishes from
/// spawned listener tasks as well as from action methods.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// so it can be held as `Arc<dyn EventBus>`.
pub trait EventBus: Send + Sync {
    /// Publish an event to a topic.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the publish operation fails.
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to one or more topics and receive a stream of events.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if subscription fails.
    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>>;
}
