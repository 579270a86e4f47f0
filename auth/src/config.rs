//! Session coordinator configuration.
//!
//! Values are provided by the application; the defaults match what the
//! coordinator was tuned for.

use std::time::Duration;

/// Coordinator configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Persistence key the safe user snapshot is stored under.
    ///
    /// Default: `"auth-session"`
    pub storage_key: String,

    /// Force a decidable state if the provider has not called back yet.
    ///
    /// Default: 5 seconds
    pub soft_failsafe: Duration,

    /// Absolute upper bound on the loading state.
    ///
    /// Default: 10 seconds
    pub hard_failsafe: Duration,

    /// Refresh the token once it is this close to expiring.
    ///
    /// Default: 5 minutes
    pub refresh_threshold: chrono::Duration,

    /// Lifetime assigned to a freshly refreshed token.
    ///
    /// Default: 1 hour
    pub token_lifetime: chrono::Duration,

    /// Event bus topic lifecycle events are published to.
    ///
    /// Default: `"auth-events"`
    pub event_topic: String,
}

impl SessionConfig {
    /// Create configuration with a custom storage key.
    #[must_use]
    pub fn new(storage_key: impl Into<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
            ..Self::default()
        }
    }

    /// Set both failsafe timeouts.
    #[must_use]
    pub const fn with_failsafes(mut self, soft: Duration, hard: Duration) -> Self {
        self.soft_failsafe = soft;
        self.hard_failsafe = hard;
        self
    }

    /// Set the refresh threshold.
    #[must_use]
    pub const fn with_refresh_threshold(mut self, threshold: chrono::Duration) -> Self {
        self.refresh_threshold = threshold;
        self
    }

    /// Set the token lifetime.
    #[must_use]
    pub const fn with_token_lifetime(mut self, lifetime: chrono::Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Set the event topic.
    #[must_use]
    pub fn with_event_topic(mut self, topic: impl Into<String>) -> Self {
        self.event_topic = topic.into();
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: "auth-session".to_string(),
            soft_failsafe: Duration::from_secs(5),
            hard_failsafe: Duration::from_secs(10),
            refresh_threshold: chrono::Duration::minutes(5),
            token_lifetime: chrono::Duration::hours(1),
            event_topic: "auth-events".to_string(),
        }
    }
}
