//! Authentication lifecycle events.
//!
//! Published to the event bus so independently deployed modules can react to
//! sign-in, sign-out and failures without depending on this crate's store.
//!
//! ```text
//! SessionStore::sign_in_with_email
//!   ↓ success
//! AuthEvent::UserLoggedIn { user_id, email, display_name, provider }
//!   ↓ published to "auth-events"
//! header module shows avatar, cart module loads saved cart
//! ```

use crate::state::{ProviderKind, User, UserId};
use auth_session_core::event::Event;
use serde::{Deserialize, Serialize};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// The user pressed sign out.
    UserInitiated,
    /// The provider reported that the user is gone.
    SessionExpired,
}

/// Authentication lifecycle events.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user is now signed in.
    UserLoggedIn {
        /// User identifier
        user_id: UserId,
        /// Email address (if known)
        email: Option<String>,
        /// Display name (if known)
        display_name: Option<String>,
        /// Sign-in method
        provider: ProviderKind,
    },

    /// The session ended.
    UserLoggedOut {
        /// Why it ended
        reason: LogoutReason,
    },

    /// An action failed.
    AuthError {
        /// Provider error code
        code: String,
        /// Translated message
        message: String,
    },
}

impl AuthEvent {
    /// Build a `UserLoggedIn` event from a user.
    #[must_use]
    pub fn logged_in(user: &User) -> Self {
        Self::UserLoggedIn {
            user_id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            provider: user.provider,
        }
    }
}

impl Event for AuthEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::UserLoggedIn { .. } => "USER_LOGGED_IN",
            Self::UserLoggedOut { .. } => "USER_LOGGED_OUT",
            Self::AuthError { .. } => "AUTH_ERROR",
        }
    }
}
