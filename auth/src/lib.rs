//! # Auth Session
//!
//! Client-side authentication session coordinator for applications made of
//! independently loaded modules that each want auth on mount.
//!
//! ## Features
//!
//! - **Single-flight initialization**: N concurrent `initialize_auth()` calls, one listener
//! - **Never hangs**: soft and hard failsafe timers bound the loading state
//! - **Safe persistence**: only a token-free projection of the user reaches storage
//! - **Typed events**: sign-in, sign-out and failures fan out over an event bus
//! - **Testable**: every collaborator is a trait with an in-memory mock
//!
//! ## Architecture
//!
//! ```text
//! UI module ──initialize_auth()──► InitializationCoordinator
//!                                    │ hydrate ─► SessionPersistence
//!                                    │ subscribe ─► IdentityProvider stream
//!                                    ▼
//! UI module ──sign_in_*()─────────► SessionStore ──► EventBus
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use auth_session::*;
//!
//! let store = SessionStore::new(identity, persistence, bus, clock, SessionConfig::default());
//! let _subscription = store.initialize_auth().await;
//!
//! match store.sign_in_with_email("a@b.com", "pw").await {
//!     Ok(user) => println!("welcome {}", user.id),
//!     Err(e) if e.is_silent() => {}
//!     Err(e) => show_field_error(e.code()),
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

mod context;

// Public modules
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod messages;
pub mod providers;
pub mod rbac;
pub mod state;
pub mod store;

#[cfg(feature = "test-utils")]
pub mod mocks;

// Re-export main types for convenience
pub use config::SessionConfig;
pub use coordinator::{InitializationCoordinator, Subscription};
pub use error::{AuthError, Result};
pub use events::{AuthEvent, LogoutReason};
pub use messages::get_auth_error_message;
pub use providers::{AuthStateStream, IdentityProvider, SessionPersistence};
pub use state::{PersistedUser, ProviderKind, Role, SessionState, User, UserId};
pub use store::SessionStore;
