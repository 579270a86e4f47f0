//! Error types for authentication session operations.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Message stored in session state when initialization itself fails.
pub const INIT_FAILURE_MESSAGE: &str =
    "Authentication could not be initialized. Please reload and try again.";

/// Comprehensive error taxonomy for the session coordinator.
///
/// Identity provider failures carry the raw provider `code` (e.g.
/// `"auth/wrong-password"`) so callers can react programmatically, while the
/// store's ambient `error` field holds the translated, user-facing message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // User Input
    // ═══════════════════════════════════════════════════════════

    /// Malformed input (bad email, weak password).
    #[error("Validation failed: {code}")]
    Validation {
        /// Provider error code
        code: String,
    },

    /// Credentials were rejected (wrong password, unknown user).
    #[error("Credentials rejected: {code}")]
    Credential {
        /// Provider error code
        code: String,
    },

    /// The account already exists (email in use, different credential).
    #[error("Account conflict: {code}")]
    Conflict {
        /// Provider error code
        code: String,
    },

    /// The user closed or cancelled an interactive flow.
    ///
    /// Not a failure; UIs should not alarm on it.
    #[error("Flow cancelled by user: {code}")]
    UserCancelled {
        /// Provider error code
        code: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Transient
    // ═══════════════════════════════════════════════════════════

    /// Too many attempts.
    #[error("Too many requests: {code}")]
    RateLimited {
        /// Provider error code
        code: String,
    },

    /// The provider could not be reached.
    #[error("Network error: {code}")]
    Network {
        /// Provider error code
        code: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Deployment
    // ═══════════════════════════════════════════════════════════

    /// The deployment is misconfigured (unauthorized domain, disabled sign-in method).
    #[error("Configuration error: {code}")]
    Configuration {
        /// Provider error code
        code: String,
    },

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Persistence adapter failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Snapshot or event payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Fallback for unknown provider codes and internal failures.
    #[error("Internal error: {code}")]
    Internal {
        /// Provider error code
        code: String,
    },
}

impl AuthError {
    /// Classify a provider error code into the taxonomy.
    ///
    /// Unknown codes map to [`AuthError::Internal`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use auth_session::AuthError;
    /// let err = AuthError::from_code("auth/wrong-password");
    /// assert!(matches!(err, AuthError::Credential { .. }));
    /// assert_eq!(err.code(), "auth/wrong-password");
    /// ```
    #[must_use]
    pub fn from_code(code: impl Into<String>) -> Self {
        let code = code.into();
        match code.as_str() {
            "auth/invalid-email" | "auth/weak-password" | "auth/missing-password" => {
                Self::Validation { code }
            }
            "auth/user-not-found"
            | "auth/wrong-password"
            | "auth/invalid-credential"
            | "auth/user-disabled" => Self::Credential { code },
            "auth/email-already-in-use" | "auth/account-exists-with-different-credential" => {
                Self::Conflict { code }
            }
            "auth/too-many-requests" => Self::RateLimited { code },
            "auth/network-request-failed" => Self::Network { code },
            "auth/popup-closed-by-user" | "auth/cancelled-popup-request" => {
                Self::UserCancelled { code }
            }
            "auth/unauthorized-domain"
            | "auth/operation-not-allowed"
            | "auth/auth-domain-config-required"
            | "auth/operation-not-supported-in-this-environment"
            | "auth/popup-blocked" => Self::Configuration { code },
            _ => Self::Internal { code },
        }
    }

    /// The provider error code this error carries.
    ///
    /// Storage and serialization failures report the internal-error code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Validation { code }
            | Self::Credential { code }
            | Self::Conflict { code }
            | Self::UserCancelled { code }
            | Self::RateLimited { code }
            | Self::Network { code }
            | Self::Configuration { code }
            | Self::Internal { code } => code,
            Self::Storage(_) | Self::Serialization(_) => "auth/internal-error",
        }
    }

    /// Returns `true` if this error is due to user input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use auth_session::AuthError;
    /// assert!(AuthError::from_code("auth/invalid-email").is_user_error());
    /// assert!(!AuthError::from_code("auth/internal-error").is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::Credential { .. } | Self::Conflict { .. }
        )
    }

    /// Returns `true` if this error points at deployment misconfiguration
    /// rather than anything the user did.
    #[must_use]
    pub const fn is_configuration_issue(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns `true` if the user deliberately abandoned the flow.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::UserCancelled { .. })
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(matches!(
            AuthError::from_code("auth/weak-password"),
            AuthError::Validation { .. }
        ));
        assert!(matches!(
            AuthError::from_code("auth/email-already-in-use"),
            AuthError::Conflict { .. }
        ));
        assert!(matches!(
            AuthError::from_code("auth/too-many-requests"),
            AuthError::RateLimited { .. }
        ));
        assert!(matches!(
            AuthError::from_code("auth/network-request-failed"),
            AuthError::Network { .. }
        ));
        assert!(matches!(
            AuthError::from_code("auth/unauthorized-domain"),
            AuthError::Configuration { .. }
        ));
        assert!(matches!(
            AuthError::from_code("auth/something-new"),
            AuthError::Internal { .. }
        ));
    }

    #[test]
    fn test_cancelled_popup_is_silent() {
        let err = AuthError::from_code("auth/popup-closed-by-user");
        assert!(err.is_silent());
        assert!(!err.is_user_error());
        assert!(!err.is_configuration_issue());
    }

    #[test]
    fn test_storage_error_code() {
        let err = AuthError::Storage("disk full".to_string());
        assert_eq!(err.code(), "auth/internal-error");
        assert_eq!(err.to_string(), "Storage error: disk full");
    }
}
