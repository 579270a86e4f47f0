//! # Auth Session Testing
//!
//! Testing utilities for the auth session coordinator.
//!
//! This crate provides:
//! - Deterministic clocks for token-expiry arithmetic
//! - An in-memory [`EventBus`](auth_session_core::event_bus::EventBus) that records every publish
//! - A one-line tracing setup for test binaries
//!
//! ## Example
//!
//! ```ignore
//! use auth_session_testing::{InMemoryEventBus, test_clock};
//!
//! #[tokio::test]
//! async fn test_sign_in_emits_event() {
//!     let bus = Arc::new(InMemoryEventBus::new());
//!     let store = SessionStore::new(identity, persistence, bus.clone(), Arc::new(test_clock()), config);
//!
//!     store.sign_in_with_email("a@b.com", "pw").await.unwrap();
//!     assert_eq!(bus.count_of("USER_LOGGED_IN"), 1);
//! }
//! ```

use auth_session_core::environment::Clock;
use chrono::{DateTime, Utc};

pub mod event_bus;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use auth_session_testing::mocks::FixedClock;
    /// use auth_session_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to.
    ///
    /// Clones share the same time, so a test can keep one handle and give
    /// another to the code under test.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a manual clock starting at `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move time forward.
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `debug`).
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use event_bus::InMemoryEventBus;
pub use mocks::{FixedClock, ManualClock, test_clock};
