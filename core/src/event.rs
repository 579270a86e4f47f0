//! Event trait and related types for lifecycle notifications.
//!
//! Events represent facts about things that have happened in the past and are immutable.
//! They are published to the [`EventBus`](crate::event_bus::EventBus) so that
//! independently deployed modules can react without coupling to the publisher.
//!
//! # Design
//!
//! Payloads are JSON. Consumers are arbitrary UI modules that only share the wire
//! format with the publisher, so a self-describing encoding is required.
//!
//! # Example
//!
//! ```
//! use auth_session_core::event::Event;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! enum CartEvent {
//!     ItemAdded { sku: String },
//! }
//!
//! impl Event for CartEvent {
//!     fn event_type(&self) -> &'static str {
//!         match self {
//!             CartEvent::ItemAdded { .. } => "ITEM_ADDED",
//!         }
//!     }
//! }
//! ```

use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

/// Error types for event operations.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),
}

/// A lifecycle event that can be published to an event bus.
///
/// # Event Naming Convention
///
/// The `event_type()` method returns a stable identifier consumers route on,
/// e.g. `"USER_LOGGED_IN"`. Renaming one is a breaking change for every subscriber.
///
/// # Thread Safety
///
/// Events must be `Send + Sync + 'static` to be passed between tasks.
pub trait Event: Send + Sync + 'static {
    /// Returns the event type identifier for this event.
    fn event_type(&self) -> &'static str;

    /// Serialize this event to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    fn to_bytes(&self) -> Result<Vec<u8>, EventError>
    where
        Self: Serialize,
    {
        serde_json::to_vec(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Deserialize an event from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the bytes are not a valid payload.
    fn from_bytes(bytes: &[u8]) -> Result<Self, EventError>
    where
        Self: DeserializeOwned + Sized,
    {
        serde_json::from_slice(bytes).map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

/// A serialized event ready to hand to a transport.
#[derive(Clone, Debug)]
pub struct SerializedEvent {
    /// Event type identifier (e.g. `"USER_LOGGED_IN"`).
    pub event_type: String,

    /// JSON-encoded payload.
    pub data: Vec<u8>,

    /// Optional transport metadata (correlation ids and the like).
    pub metadata: Option<serde_json::Value>,
}

impl SerializedEvent {
    /// Create a new serialized event.
    #[must_use]
    pub const fn new(
        event_type: String,
        data: Vec<u8>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_type,
            data,
            metadata,
        }
    }

    /// Serialize a typed event.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the payload cannot be encoded.
    pub fn from_event<E: Event + Serialize>(
        event: &E,
        metadata: Option<serde_json::Value>,
    ) -> Result<Self, EventError> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            data: event.to_bytes()?,
            metadata,
        })
    }

    /// Decode the payload back into a typed event.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the payload does not match `E`.
    pub fn decode<E: Event + DeserializeOwned>(&self) -> Result<E, EventError> {
        E::from_bytes(&self.data)
    }
}

impl fmt::Display for SerializedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializedEvent {{ type: {}, size: {} bytes }}",
            self.event_type,
            self.data.len()
        )
    }
}
