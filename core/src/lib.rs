//! # Auth Session Core
//!
//! Environment traits shared by the auth session coordinator and its test tooling.
//!
//! The session coordinator never reaches for ambient globals. Everything it talks to
//! outside of its own state is injected through one of the seams defined here:
//!
//! - **Clock**: wall-clock time, used for token expiry arithmetic
//! - **Event**: a typed lifecycle fact with a stable type name and a JSON payload
//! - **`EventBus`**: the cross-module transport lifecycle events are published to
//!
//! ## Example
//!
//! ```ignore
//! use auth_session_core::environment::{Clock, SystemClock};
//! use std::sync::Arc;
//!
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//! let expires_at = clock.now() + chrono::Duration::hours(1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod event;
pub mod event_bus;

/// Environment module - Dependency injection traits
///
/// All external dependencies that are not domain adapters (identity provider,
/// persistence) live here and are injected at construction time.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
