//! The public session store.
//!
//! One instance per application, created explicitly and handed to every module
//! that needs auth (there is no global). It composes the
//! [`InitializationCoordinator`] with the sign-in, sign-up, sign-out and token
//! actions.
//!
//! # Lifecycle
//!
//! ```text
//! SessionStore::new(..)        state: loading, not initialized
//!   ↓
//! initialize_auth() × N        one startup sequence, N identical handles
//!   ↓
//! sign_in_* / sign_out / refresh_token
//!   ↓
//! shutdown()                   timers cancelled, listener stopped
//! ```
//!
//! # Error propagation
//!
//! Failed actions do two things: the translated message goes into
//! [`SessionState::error`] for ambient display, and the original [`AuthError`]
//! is returned so the caller can react to the specific code.
//!
//! Concurrent actions are not serialized. They interleave at provider calls and
//! the last write wins; callers are expected to disable triggers while
//! `is_loading` is set.

use crate::config::SessionConfig;
use crate::context::SessionContext;
use crate::coordinator::{InitializationCoordinator, Subscription};
use crate::error::{AuthError, Result};
use crate::events::{AuthEvent, LogoutReason};
use crate::messages::get_auth_error_message;
use crate::providers::{IdentityProvider, SessionPersistence};
use crate::rbac;
use crate::state::{Role, SessionState, User};
use auth_session_core::environment::Clock;
use auth_session_core::event_bus::EventBus;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Application-wide authentication session.
///
/// Cheap to clone; clones share the same session.
///
/// # Examples
///
/// ```ignore
/// let store = SessionStore::new(
///     FirebaseIdentity::new(app),
///     LocalStorage::new(),
///     Arc::new(shell_event_bus),
///     Arc::new(SystemClock),
///     SessionConfig::default(),
/// );
///
/// let _subscription = store.initialize_auth().await;
/// store.sign_in_with_email("a@b.com", "pw").await?;
/// assert!(store.state().is_authenticated);
/// ```
pub struct SessionStore<I, P> {
    ctx: Arc<SessionContext<I, P>>,
    coordinator: Arc<InitializationCoordinator<I, P>>,
}

impl<I, P> Clone for SessionStore<I, P> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}

impl<I, P> SessionStore<I, P>
where
    I: IdentityProvider + 'static,
    P: SessionPersistence + 'static,
{
    /// Create a store holding its dependencies directly.
    #[must_use]
    pub fn new(
        identity: I,
        persistence: P,
        events: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let ctx = Arc::new(SessionContext::new(
            identity,
            persistence,
            events,
            clock,
            config,
        ));
        let coordinator = Arc::new(InitializationCoordinator::new(Arc::clone(&ctx)));
        Self { ctx, coordinator }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════

    /// Start auth, or join the start already under way. See
    /// [`InitializationCoordinator::initialize`].
    pub async fn initialize_auth(&self) -> Subscription {
        self.coordinator.initialize().await
    }

    /// Cancel failsafes, stop the live listener and allow a fresh initialization.
    ///
    /// Session state is left as is.
    pub fn shutdown(&self) {
        self.coordinator.shutdown();
    }

    // ═══════════════════════════════════════════════════════════════════
    // Reads
    // ═══════════════════════════════════════════════════════════════════

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.ctx.snapshot()
    }

    /// Observe state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.ctx.subscribe()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.ctx.snapshot().user
    }

    /// The provider's own view of the signed-in user.
    #[must_use]
    pub fn provider_user(&self) -> Option<User> {
        self.ctx.identity.current_user()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Actions
    // ═══════════════════════════════════════════════════════════════════

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the provider's error after recording its translated message in state.
    pub async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<User> {
        self.authenticate(self.ctx.identity.sign_in_with_email(email, password))
            .await
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns the provider's error after recording its translated message in state.
    pub async fn sign_up_with_email(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<User> {
        self.authenticate(
            self.ctx
                .identity
                .sign_up_with_email(email, password, display_name),
        )
        .await
    }

    /// Sign in with Google.
    ///
    /// # Errors
    ///
    /// Returns the provider's error after recording its translated message in state.
    pub async fn sign_in_with_google(&self) -> Result<User> {
        self.authenticate(self.ctx.identity.sign_in_with_google())
            .await
    }

    /// Sign in with GitHub.
    ///
    /// # Errors
    ///
    /// Returns the provider's error after recording its translated message in state.
    pub async fn sign_in_with_github(&self) -> Result<User> {
        self.authenticate(self.ctx.identity.sign_in_with_github())
            .await
    }

    /// Send a password reset email. Touches only `is_loading` and `error`.
    ///
    /// # Errors
    ///
    /// Returns the provider's error after recording its translated message in state.
    pub async fn reset_password(&self, email: &str) -> Result<()> {
        self.begin();
        match self.ctx.identity.reset_password(email).await {
            Ok(()) => {
                self.ctx.update(|state| state.is_loading = false);
                Ok(())
            }
            Err(e) => {
                let message = get_auth_error_message(e.code());
                tracing::warn!(code = %e.code(), "Password reset failed");
                self.ctx.update(|state| {
                    state.error = Some(message.to_string());
                    state.is_loading = false;
                });
                Err(e)
            }
        }
    }

    /// Sign out.
    ///
    /// The local session is always cleared, even if the provider call fails:
    /// the user asked to leave, so nothing of theirs stays in memory or storage.
    ///
    /// # Errors
    ///
    /// Returns the provider's error (after local cleanup) so the caller can
    /// tell the remote session may still be alive.
    pub async fn sign_out(&self) -> Result<()> {
        self.begin();
        let remote = self.ctx.identity.sign_out().await;

        let mut previous = None;
        self.ctx.update(|state| {
            previous = state.user.take();
            state.set_user(None);
            state.is_loading = false;
        });
        self.ctx.clear_persisted().await;

        if let Some(user) = previous {
            tracing::info!(user_id = %user.id, "User signed out");
        }
        self.ctx
            .emit(AuthEvent::UserLoggedOut {
                reason: LogoutReason::UserInitiated,
            })
            .await;

        if let Err(e) = remote {
            self.record_failure(&e).await;
            return Err(e);
        }
        Ok(())
    }

    /// Refresh the current user's ID token.
    ///
    /// Best-effort: a failure is logged and leaves the session, `is_loading` and
    /// `error` untouched.
    ///
    /// # Returns
    ///
    /// The new token, or `None` if nobody is signed in or the refresh failed.
    pub async fn refresh_token(&self) -> Option<String> {
        if self.ctx.snapshot().user.is_none() {
            tracing::debug!("Skipping token refresh: no user");
            return None;
        }

        let token = match self.ctx.identity.refresh_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::debug!("Provider returned no token");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, keeping current session");
                return None;
            }
        };

        let expiry = self.ctx.clock.now() + self.ctx.config.token_lifetime;
        let mut refreshed = None;
        self.ctx.update(|state| {
            if let Some(user) = state.user.as_mut() {
                user.id_token = Some(token.clone());
                user.token_expiry = Some(expiry);
                refreshed = Some(user.clone());
            }
        });

        if let Some(user) = refreshed {
            tracing::debug!(user_id = %user.id, %expiry, "Token refreshed");
            self.ctx.persist_user(&user).await;
        }
        Some(token)
    }

    /// Returns `true` if the current token is within the refresh threshold.
    #[must_use]
    pub fn needs_token_refresh(&self) -> bool {
        self.ctx.snapshot().user.is_some_and(|user| {
            user.needs_token_refresh(self.ctx.clock.now(), self.ctx.config.refresh_threshold)
        })
    }

    /// The current ID token, refreshed first when forced or about to expire.
    ///
    /// Falls back to the token already in memory if the refresh fails.
    pub async fn id_token(&self, force_refresh: bool) -> Option<String> {
        if force_refresh || self.needs_token_refresh() {
            if let Some(token) = self.refresh_token().await {
                return Some(token);
            }
        }
        self.current_user().and_then(|user| user.id_token)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Direct setters
    // ═══════════════════════════════════════════════════════════════════

    /// Set the loading flag.
    pub fn set_loading(&self, loading: bool) {
        self.ctx.update(|state| state.is_loading = loading);
    }

    /// Set the ambient error message.
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.ctx.update(|state| state.error = Some(message));
    }

    /// Clear the ambient error message.
    pub fn clear_error(&self) {
        self.ctx.update(|state| state.error = None);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Role checks
    // ═══════════════════════════════════════════════════════════════════

    /// See [`rbac::has_role`].
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        rbac::has_role(self.current_user().as_ref(), role)
    }

    /// See [`rbac::has_any_role`].
    #[must_use]
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        rbac::has_any_role(self.current_user().as_ref(), roles)
    }

    /// See [`rbac::has_all_roles`].
    #[must_use]
    pub fn has_all_roles(&self, roles: &[Role]) -> bool {
        rbac::has_all_roles(self.current_user().as_ref(), roles)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Internals
    // ═══════════════════════════════════════════════════════════════════

    fn begin(&self) {
        self.ctx.update(|state| {
            state.is_loading = true;
            state.error = None;
        });
    }

    async fn authenticate(&self, attempt: impl Future<Output = Result<User>>) -> Result<User> {
        self.begin();
        match attempt.await {
            Ok(user) => {
                self.ctx.update(|state| {
                    state.set_user(Some(user.clone()));
                    state.is_loading = false;
                });
                self.ctx.persist_user(&user).await;
                tracing::info!(
                    user_id = %user.id,
                    provider = user.provider.as_str(),
                    "User signed in"
                );
                self.ctx.emit(AuthEvent::logged_in(&user)).await;
                Ok(user)
            }
            Err(e) => {
                self.record_failure(&e).await;
                Err(e)
            }
        }
    }

    async fn record_failure(&self, error: &AuthError) {
        let code = error.code().to_string();
        let message = get_auth_error_message(&code).to_string();

        if error.is_silent() {
            tracing::debug!(%code, "Auth flow cancelled by user");
        } else if error.is_configuration_issue() {
            tracing::error!(%code, "Auth backend misconfigured");
        } else {
            tracing::warn!(%code, "Auth action failed");
        }

        self.ctx.update(|state| {
            state.error = Some(message.clone());
            state.is_loading = false;
        });
        self.ctx.emit(AuthEvent::AuthError { code, message }).await;
    }
}
