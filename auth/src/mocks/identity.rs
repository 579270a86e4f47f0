//! Mock identity provider for testing.

use crate::context::lock;
use crate::error::{AuthError, Result};
use crate::providers::{AuthStateStream, IdentityProvider};
use crate::state::{ProviderKind, Role, User};
use futures::stream;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

type Listener = mpsc::UnboundedSender<Result<Option<User>>>;

#[derive(Default)]
struct MockIdentityState {
    user: Option<User>,
    current: Option<User>,
    fail_with: Option<String>,
    sign_out_error: Option<String>,
    refresh_error: Option<String>,
    refreshed_token: Option<String>,
    subscribe_error: Option<String>,
    listeners: Vec<Listener>,
    subscriptions: usize,
    calls: Vec<&'static str>,
}

/// Mock identity provider.
///
/// Credential calls succeed with the scripted user (or one derived from the
/// request) unless a failure code has been set. The auth state stream stays
/// silent until [`MockIdentityProvider::push_auth_state`] is called.
#[derive(Clone, Default)]
pub struct MockIdentityProvider {
    state: Arc<Mutex<MockIdentityState>>,
}

impl MockIdentityProvider {
    /// Create a new mock identity provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return this user from every successful sign-in or sign-up.
    #[must_use]
    pub fn with_user(self, user: User) -> Self {
        lock(&self.state).user = Some(user);
        self
    }

    /// Fail every credential call with this provider code.
    #[must_use]
    pub fn failing_with(self, code: &str) -> Self {
        lock(&self.state).fail_with = Some(code.to_string());
        self
    }

    /// Fail `sign_out` with this provider code.
    #[must_use]
    pub fn failing_sign_out_with(self, code: &str) -> Self {
        lock(&self.state).sign_out_error = Some(code.to_string());
        self
    }

    /// Fail `refresh_token` with this provider code.
    #[must_use]
    pub fn failing_refresh_with(self, code: &str) -> Self {
        lock(&self.state).refresh_error = Some(code.to_string());
        self
    }

    /// Token handed out by `refresh_token`.
    #[must_use]
    pub fn with_refreshed_token(self, token: &str) -> Self {
        lock(&self.state).refreshed_token = Some(token.to_string());
        self
    }

    /// Fail subscription setup with this provider code.
    #[must_use]
    pub fn failing_subscribe_with(self, code: &str) -> Self {
        lock(&self.state).subscribe_error = Some(code.to_string());
        self
    }

    /// Stop failing subscription setup.
    pub fn allow_subscribe(&self) {
        lock(&self.state).subscribe_error = None;
    }

    /// Deliver an auth state change to every live subscriber.
    pub fn push_auth_state(&self, user: Option<User>) {
        let mut state = lock(&self.state);
        state.current.clone_from(&user);
        state
            .listeners
            .retain(|listener| listener.send(Ok(user.clone())).is_ok());
    }

    /// Deliver a stream error to every live subscriber.
    pub fn push_stream_error(&self, code: &str) {
        let mut state = lock(&self.state);
        state
            .listeners
            .retain(|listener| listener.send(Err(AuthError::from_code(code))).is_ok());
    }

    /// How many times `auth_state_changes` succeeded.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        lock(&self.state).subscriptions
    }

    /// Subscribers whose stream has not been dropped.
    #[must_use]
    pub fn live_listeners(&self) -> usize {
        lock(&self.state)
            .listeners
            .iter()
            .filter(|listener| !listener.is_closed())
            .count()
    }

    /// Names of the provider methods called so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.state).calls.clone()
    }

    fn credential_call(&self, method: &'static str, fallback: impl FnOnce() -> User) -> Result<User> {
        let mut state = lock(&self.state);
        state.calls.push(method);
        if let Some(code) = state.fail_with.clone() {
            return Err(AuthError::from_code(code));
        }
        let user = state.user.clone().unwrap_or_else(fallback);
        state.current = Some(user.clone());
        Ok(user)
    }
}

fn derived_user(email: &str, provider: ProviderKind) -> User {
    User::new(format!("mock-{email}"), Role::Customer, provider).with_email(email)
}

impl IdentityProvider for MockIdentityProvider {
    fn sign_in_with_email(
        &self,
        email: &str,
        _password: &str,
    ) -> impl Future<Output = Result<User>> + Send {
        let outcome = self.credential_call("sign_in_with_email", || {
            derived_user(email, ProviderKind::Email)
        });
        async move { outcome }
    }

    fn sign_up_with_email(
        &self,
        email: &str,
        _password: &str,
        display_name: Option<&str>,
    ) -> impl Future<Output = Result<User>> + Send {
        let outcome = self.credential_call("sign_up_with_email", || {
            let user = derived_user(email, ProviderKind::Email);
            match display_name {
                Some(name) => user.with_display_name(name),
                None => user,
            }
        });
        async move { outcome }
    }

    fn reset_password(&self, _email: &str) -> impl Future<Output = Result<()>> + Send {
        let outcome = {
            let mut state = lock(&self.state);
            state.calls.push("reset_password");
            state
                .fail_with
                .as_deref()
                .map_or(Ok(()), |code| Err(AuthError::from_code(code)))
        };
        async move { outcome }
    }

    fn sign_in_with_google(&self) -> impl Future<Output = Result<User>> + Send {
        let outcome = self.credential_call("sign_in_with_google", || {
            derived_user("google-user@example.com", ProviderKind::Google)
        });
        async move { outcome }
    }

    fn sign_in_with_github(&self) -> impl Future<Output = Result<User>> + Send {
        let outcome = self.credential_call("sign_in_with_github", || {
            derived_user("github-user@example.com", ProviderKind::GitHub)
        });
        async move { outcome }
    }

    fn sign_out(&self) -> impl Future<Output = Result<()>> + Send {
        let outcome = {
            let mut state = lock(&self.state);
            state.calls.push("sign_out");
            match state.sign_out_error.clone() {
                Some(code) => Err(AuthError::from_code(code)),
                None => {
                    state.current = None;
                    Ok(())
                }
            }
        };
        async move { outcome }
    }

    fn current_user(&self) -> Option<User> {
        lock(&self.state).current.clone()
    }

    fn refresh_token(&self) -> impl Future<Output = Result<Option<String>>> + Send {
        let outcome = {
            let mut state = lock(&self.state);
            state.calls.push("refresh_token");
            match &state.refresh_error {
                Some(code) => Err(AuthError::from_code(code.as_str())),
                None => Ok(state.refreshed_token.clone()),
            }
        };
        async move { outcome }
    }

    fn auth_state_changes(&self) -> Result<AuthStateStream> {
        let mut state = lock(&self.state);
        state.calls.push("auth_state_changes");
        if let Some(code) = &state.subscribe_error {
            return Err(AuthError::from_code(code.as_str()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.listeners.push(tx);
        state.subscriptions += 1;

        Ok(Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })))
    }
}
