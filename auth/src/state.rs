//! Session state types.
//!
//! This module defines the data model shared by the coordinator, the store and
//! the adapters. All types are `Clone` so snapshots can be handed to observers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Identity provider user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Wrap a provider-issued identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Enums
// ═══════════════════════════════════════════════════════════════════════

/// Application role. Exactly one per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Back-office administrator.
    Admin,
    /// Shopper.
    Customer,
    /// Seller.
    Vendor,
}

impl Role {
    /// Get the role name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Customer => "CUSTOMER",
            Self::Vendor => "VENDOR",
        }
    }
}

/// How the user authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Email and password.
    Email,
    /// Google popup/redirect flow.
    Google,
    /// GitHub popup/redirect flow.
    GitHub,
    /// Anonymous session.
    Anonymous,
}

impl ProviderKind {
    /// Get the provider name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Google => "google",
            Self::GitHub => "github",
            Self::Anonymous => "anonymous",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// User
// ═══════════════════════════════════════════════════════════════════════

/// Authenticated user as known in memory.
///
/// `id_token` and `token_expiry` are ephemeral. Persist a [`PersistedUser`], never this.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Provider user ID.
    pub id: UserId,
    /// Email address.
    pub email: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Avatar URL.
    pub photo_url: Option<String>,
    /// Email verified flag.
    pub email_verified: bool,
    /// Application role.
    pub role: Role,
    /// Sign-in method.
    pub provider: ProviderKind,
    /// Current ID token.
    pub id_token: Option<String>,
    /// When `id_token` expires.
    pub token_expiry: Option<DateTime<Utc>>,
}

impl User {
    /// Create a user with the given id and role and no profile data.
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role, provider: ProviderKind) -> Self {
        Self {
            id: UserId::new(id),
            email: None,
            display_name: None,
            photo_url: None,
            email_verified: false,
            role,
            provider,
            id_token: None,
            token_expiry: None,
        }
    }

    /// Set email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set token and its expiry.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, expiry: DateTime<Utc>) -> Self {
        self.id_token = Some(token.into());
        self.token_expiry = Some(expiry);
        self
    }

    /// Returns `true` once the token is within `threshold` of expiring.
    ///
    /// A user without a known expiry never needs a refresh.
    #[must_use]
    pub fn needs_token_refresh(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.token_expiry
            .is_some_and(|expiry| expiry - now <= threshold)
    }

    /// Returns `true` if the token expiry has passed.
    #[must_use]
    pub fn is_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.token_expiry.is_some_and(|expiry| expiry <= now)
    }
}

/// Safe projection of [`User`] for long-term storage.
///
/// Has no token fields at all, so nothing ephemeral can be serialized by accident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedUser {
    /// Provider user ID.
    pub id: UserId,
    /// Email address.
    pub email: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Avatar URL.
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    /// Email verified flag.
    pub email_verified: bool,
    /// Application role.
    pub role: Role,
    /// Sign-in method.
    pub provider: ProviderKind,
}

impl PersistedUser {
    /// Decode a stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Serialization`](crate::AuthError::Serialization) if
    /// `raw` is not a valid snapshot.
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Encode for storage.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Serialization`](crate::AuthError::Serialization) if
    /// encoding fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rehydrate into an in-memory user with no token.
    #[must_use]
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            display_name: self.display_name,
            photo_url: self.photo_url,
            email_verified: self.email_verified,
            role: self.role,
            provider: self.provider,
            id_token: None,
            token_expiry: None,
        }
    }
}

impl From<&User> for PersistedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            photo_url: user.photo_url.clone(),
            email_verified: user.email_verified,
            role: user.role,
            provider: user.provider,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Session State
// ═══════════════════════════════════════════════════════════════════════

/// Observable session state.
///
/// Fields are readable by anyone holding a snapshot; the store only ever changes
/// them through [`SessionState::set_user`] and [`SessionState::mark_initialized`].
///
/// # Examples
///
/// ```
/// # use auth_session::state::SessionState;
/// let state = SessionState::default();
/// assert!(state.is_loading);
/// assert!(!state.is_initialized);
/// assert!(!state.is_authenticated);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Current user (if signed in).
    pub user: Option<User>,
    /// Always `user.is_some()`.
    pub is_authenticated: bool,
    /// An action or initialization is in progress.
    pub is_loading: bool,
    /// Translated message for the last failed action.
    pub error: Option<String>,
    /// Initialization reached a decidable state. Never reverts.
    pub is_initialized: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
            error: None,
            is_initialized: false,
        }
    }
}

impl SessionState {
    /// Replace the user, keeping `is_authenticated` in step.
    pub fn set_user(&mut self, user: Option<User>) {
        self.is_authenticated = user.is_some();
        self.user = user;
    }

    /// Finish initialization: stop loading and latch `is_initialized`.
    pub const fn mark_initialized(&mut self) {
        self.is_loading = false;
        self.is_initialized = true;
    }
}
