//! Provider error code → user-facing message translation.
//!
//! The table never leaks provider vocabulary to end users: unknown codes get a
//! generic sentence and are only visible to developers through a `debug!` log,
//! emitted the first time each code is seen.

use std::collections::HashSet;
use std::sync::{LazyLock, Mutex, PoisonError};

/// Unknown codes already logged.
static SEEN_UNKNOWN: LazyLock<Mutex<HashSet<String>>> = LazyLock::new(Mutex::default);

/// Returns `true` the first time `code` is passed.
fn first_sighting(code: &str) -> bool {
    let mut seen = SEEN_UNKNOWN.lock().unwrap_or_else(PoisonError::into_inner);
    if seen.contains(code) {
        return false;
    }
    seen.insert(code.to_string())
}

/// Message returned for any code not in the table.
pub const GENERIC_AUTH_ERROR: &str =
    "We were unable to complete sign-in. Please try again or use a different sign-in method.";

/// Translate a provider error code into a human-readable sentence.
///
/// # Examples
///
/// ```
/// # use auth_session::messages::{get_auth_error_message, GENERIC_AUTH_ERROR};
/// assert_eq!(
///     get_auth_error_message("auth/wrong-password"),
///     "Incorrect password. Please try again."
/// );
/// assert_eq!(get_auth_error_message("auth/totally-made-up"), GENERIC_AUTH_ERROR);
/// ```
#[must_use]
pub fn get_auth_error_message(code: &str) -> &'static str {
    match code {
        "auth/invalid-email" => "Please enter a valid email address.",
        "auth/user-not-found" => "No account found with this email address.",
        "auth/wrong-password" => "Incorrect password. Please try again.",
        "auth/invalid-credential" => "Invalid email or password. Please check your credentials.",
        "auth/email-already-in-use" => "An account with this email address already exists.",
        "auth/weak-password" => "Password should be at least 6 characters long.",
        "auth/network-request-failed" => {
            "Network error. Please check your connection and try again."
        }
        "auth/too-many-requests" => "Too many failed attempts. Please wait a moment and try again.",
        "auth/popup-closed-by-user" => "Sign-in was cancelled. Please try again.",
        "auth/cancelled-popup-request" => "Only one sign-in window can be open at a time.",
        "auth/popup-blocked" => "The sign-in popup was blocked. Please allow popups and try again.",
        "auth/account-exists-with-different-credential" => {
            "An account already exists with this email using a different sign-in method."
        }
        "auth/unauthorized-domain" => "This domain is not authorized for sign-in.",
        "auth/operation-not-allowed" => "This sign-in method is not enabled.",
        "auth/auth-domain-config-required" => "Sign-in is not configured for this application.",
        "auth/operation-not-supported-in-this-environment" => {
            "This sign-in method is not supported in this environment."
        }
        "auth/internal-error" => "An internal error occurred. Please try again.",
        unknown => {
            if first_sighting(unknown) {
                tracing::debug!(code = %unknown, "Unmapped auth error code");
            }
            GENERIC_AUTH_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_are_specific() {
        let codes = [
            "auth/invalid-email",
            "auth/user-not-found",
            "auth/wrong-password",
            "auth/invalid-credential",
            "auth/email-already-in-use",
            "auth/weak-password",
            "auth/network-request-failed",
            "auth/too-many-requests",
            "auth/popup-closed-by-user",
            "auth/cancelled-popup-request",
            "auth/account-exists-with-different-credential",
            "auth/unauthorized-domain",
            "auth/operation-not-allowed",
            "auth/auth-domain-config-required",
            "auth/operation-not-supported-in-this-environment",
            "auth/internal-error",
        ];

        for code in codes {
            assert_ne!(get_auth_error_message(code), GENERIC_AUTH_ERROR, "{code}");
        }
    }

    #[test]
    fn test_unknown_code_does_not_leak() {
        let message = get_auth_error_message("auth/totally-made-up");
        assert_eq!(message, GENERIC_AUTH_ERROR);
        assert!(!message.contains("auth/"));
    }

    #[test]
    fn test_unknown_code_is_reported_once() {
        let code = "auth/reported-once";
        assert_eq!(get_auth_error_message(code), GENERIC_AUTH_ERROR);

        assert!(!first_sighting(code));
        assert_eq!(get_auth_error_message(code), GENERIC_AUTH_ERROR);
        assert!(first_sighting("auth/never-seen-before"));
    }
}
