//! Shared session context.
//!
//! Owns the observable state cell and the injected dependencies. Both the
//! coordinator and the store write state exclusively through [`SessionContext::update`],
//! which re-establishes the state invariants after every mutation.

use crate::config::SessionConfig;
use crate::events::{AuthEvent, LogoutReason};
use crate::providers::{IdentityProvider, SessionPersistence};
use crate::state::{PersistedUser, SessionState, User};
use auth_session_core::environment::Clock;
use auth_session_core::event::SerializedEvent;
use auth_session_core::event_bus::EventBus;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct SessionContext<I, P> {
    pub(crate) identity: I,
    pub(crate) persistence: P,
    pub(crate) events: Arc<dyn EventBus>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: SessionConfig,
    state: watch::Sender<SessionState>,
}

impl<I, P> SessionContext<I, P>
where
    I: IdentityProvider,
    P: SessionPersistence,
{
    pub(crate) fn new(
        identity: I,
        persistence: P,
        events: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            identity,
            persistence,
            events,
            clock,
            config,
            state,
        }
    }

    pub(crate) fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Apply a mutation and notify observers.
    ///
    /// `is_authenticated` is recomputed from `user` and `is_initialized` cannot
    /// go back to `false`, whatever `f` did.
    pub(crate) fn update(&self, f: impl FnOnce(&mut SessionState)) {
        self.state.send_modify(|state| {
            let was_initialized = state.is_initialized;
            f(state);
            state.is_authenticated = state.user.is_some();
            state.is_initialized |= was_initialized;
        });
    }

    /// Read the persisted snapshot. Storage and decode failures yield `None`.
    pub(crate) async fn load_persisted(&self) -> Option<User> {
        let raw = match self.persistence.get(&self.config.storage_key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted session");
                return None;
            }
        };

        match PersistedUser::from_json(&raw) {
            Ok(persisted) => Some(persisted.into_user()),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable persisted session");
                None
            }
        }
    }

    /// Persist the safe projection of `user`. Failures are logged only.
    pub(crate) async fn persist_user(&self, user: &User) {
        let json = match PersistedUser::from(user).to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user.id, "Failed to encode session snapshot");
                return;
            }
        };

        if let Err(e) = self.persistence.set(&self.config.storage_key, json).await {
            tracing::warn!(error = %e, user_id = %user.id, "Failed to persist session");
        }
    }

    pub(crate) async fn clear_persisted(&self) {
        if let Err(e) = self.persistence.remove(&self.config.storage_key).await {
            tracing::warn!(error = %e, "Failed to clear persisted session");
        }
    }

    /// Publish a lifecycle event. Failures are logged only.
    pub(crate) async fn emit(&self, event: AuthEvent) {
        let serialized = match SerializedEvent::from_event(&event, None) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode auth event");
                return;
            }
        };

        if let Err(e) = self.events.publish(&self.config.event_topic, &serialized).await {
            tracing::warn!(
                error = %e,
                event_type = %serialized.event_type,
                "Failed to publish auth event"
            );
        }
    }

    /// Apply a value delivered by the provider's auth state stream.
    ///
    /// The provider is authoritative: this overrides hydrated or failsafe state.
    /// Only the first delivery finishes initialization.
    pub(crate) async fn apply_auth_state(&self, user: Option<User>, first: bool) {
        let mut previous = None;
        self.update(|state| {
            previous = state.user.take();
            state.set_user(user.clone());
            if first {
                state.mark_initialized();
            }
        });

        match user {
            Some(user) => {
                self.persist_user(&user).await;
                let changed = previous.as_ref().is_none_or(|p| p.id != user.id);
                if first || changed {
                    tracing::info!(user_id = %user.id, first, "Provider reported signed-in user");
                    self.emit(AuthEvent::logged_in(&user)).await;
                }
            }
            None => {
                self.clear_persisted().await;
                if let Some(previous) = previous {
                    tracing::info!(user_id = %previous.id, "Provider reported session ended");
                    self.emit(AuthEvent::UserLoggedOut {
                        reason: LogoutReason::SessionExpired,
                    })
                    .await;
                }
            }
        }
    }
}
