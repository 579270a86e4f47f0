//! Identity provider trait.

use crate::error::Result;
use crate::state::User;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;

/// Push-style stream of auth state changes.
///
/// `Ok(Some(user))` means signed in, `Ok(None)` means signed out, `Err` is a
/// transient stream error that does not end the subscription.
pub type AuthStateStream = Pin<Box<dyn Stream<Item = Result<Option<User>>> + Send>>;

/// Identity provider.
///
/// This trait abstracts over the concrete auth backend. Failures are reported
/// as [`AuthError`](crate::AuthError) values carrying the backend's error code
/// (see [`AuthError::from_code`](crate::AuthError::from_code)).
pub trait IdentityProvider: Send + Sync {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns error if the credentials are rejected or the backend is unreachable.
    fn sign_in_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Create an account with email and password.
    ///
    /// # Errors
    ///
    /// Returns error if the email is taken, the password is weak, or the backend
    /// is unreachable.
    fn sign_up_with_email(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Send a password reset email.
    ///
    /// # Errors
    ///
    /// Returns error if the email is invalid or the backend is unreachable.
    fn reset_password(&self, email: &str) -> impl Future<Output = Result<()>> + Send;

    /// Run the Google sign-in flow.
    ///
    /// # Errors
    ///
    /// Returns error if the flow is cancelled, blocked, or rejected.
    fn sign_in_with_google(&self) -> impl Future<Output = Result<User>> + Send;

    /// Run the GitHub sign-in flow.
    ///
    /// # Errors
    ///
    /// Returns error if the flow is cancelled, blocked, or rejected.
    fn sign_in_with_github(&self) -> impl Future<Output = Result<User>> + Send;

    /// Sign out on the backend.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable.
    fn sign_out(&self) -> impl Future<Output = Result<()>> + Send;

    /// The user the backend currently considers signed in.
    fn current_user(&self) -> Option<User>;

    /// Force a fresh ID token for the current user.
    ///
    /// # Returns
    ///
    /// The new token, or `None` if nobody is signed in.
    ///
    /// # Errors
    ///
    /// Returns error if the refresh request fails.
    fn refresh_token(&self) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Subscribe to auth state changes.
    ///
    /// Dropping the returned stream unsubscribes.
    ///
    /// # Errors
    ///
    /// Returns error if the subscription cannot be set up.
    fn auth_state_changes(&self) -> Result<AuthStateStream>;
}
