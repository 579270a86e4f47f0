//! Single-flight auth initialization.
//!
//! Any number of independently loaded modules may call
//! [`InitializationCoordinator::initialize`] on mount. Exactly one startup sequence
//! runs; every caller receives the same [`Subscription`].
//!
//! # Startup sequence
//!
//! ```text
//! arm soft (5s) + hard (10s) failsafes
//!   ↓
//! hydrate persisted user (best-effort, optimistic)
//!   ↓
//! subscribe to provider auth state stream
//!   ↓
//! first delivery: cancel failsafes, set user, is_initialized = true
//! ```
//!
//! The failsafes and the first delivery race. Whichever comes first finishes
//! initialization, but a late delivery still replaces the user.

use crate::context::{SessionContext, lock};
use crate::error::{INIT_FAILURE_MESSAGE, Result};
use crate::providers::{AuthStateStream, IdentityProvider, SessionPersistence};
use futures::StreamExt;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::AbortHandle;

/// Handle to the live auth state listener.
///
/// Clones share the same listener; two handles are equal when they refer to
/// the same subscription.
#[derive(Clone)]
pub struct Subscription {
    id: u64,
    listener: Option<AbortHandle>,
}

impl Subscription {
    fn new(id: u64, listener: AbortHandle) -> Self {
        Self {
            id,
            listener: Some(listener),
        }
    }

    /// A handle with no listener behind it, handed out when initialization failed.
    #[must_use]
    pub const fn noop() -> Self {
        Self {
            id: 0,
            listener: None,
        }
    }

    /// Subscription identifier. `0` for a no-op handle.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns `true` while the listener task is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.listener.as_ref().is_some_and(|l| !l.is_finished())
    }

    /// Stop the listener. Safe to call repeatedly and from any clone.
    pub fn unsubscribe(&self) {
        if let Some(listener) = &self.listener {
            listener.abort();
        }
    }
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Subscription {}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Single-flight state.
enum InitPhase {
    NotStarted,
    InFlight {
        waiter: watch::Receiver<Option<Subscription>>,
        generation: u64,
    },
    Done(Subscription),
}

/// Timers armed by one run, tagged with that run's generation.
struct Failsafes {
    generation: u64,
    soft: AbortHandle,
    hard: AbortHandle,
}

impl Failsafes {
    fn cancel(&self) {
        self.soft.abort();
        self.hard.abort();
    }
}

/// Owns the startup sequence, the failsafe timers and the live listener.
///
/// `shutdown` bumps the generation. A run checks its generation under the lock
/// of every slot it writes (`failsafes`, `live`, `phase`), so a run that
/// outlives a shutdown never touches what a newer run installed.
pub struct InitializationCoordinator<I, P> {
    ctx: Arc<SessionContext<I, P>>,
    phase: Mutex<InitPhase>,
    live: Mutex<Option<Subscription>>,
    failsafes: Mutex<Option<Failsafes>>,
    generation: AtomicU64,
    next_subscription: AtomicU64,
}

impl<I, P> InitializationCoordinator<I, P>
where
    I: IdentityProvider + 'static,
    P: SessionPersistence + 'static,
{
    pub(crate) fn new(ctx: Arc<SessionContext<I, P>>) -> Self {
        Self {
            ctx,
            phase: Mutex::new(InitPhase::NotStarted),
            live: Mutex::new(None),
            failsafes: Mutex::new(None),
            generation: AtomicU64::new(0),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Initialize auth, or join the initialization already under way.
    ///
    /// Never fails: if setup fails, state is forced to initialized with an error
    /// message and a [`Subscription::noop`] is returned. A later call retries.
    pub async fn initialize(self: &Arc<Self>) -> Subscription {
        let (mut waiter, generation) = {
            let mut phase = lock(&self.phase);
            match &*phase {
                InitPhase::Done(subscription) => return subscription.clone(),
                InitPhase::InFlight { waiter, generation } => (waiter.clone(), *generation),
                InitPhase::NotStarted => {
                    // Cache before the first await so concurrent callers join this run.
                    let (tx, rx) = watch::channel(None);
                    let generation = self.generation.load(Ordering::Acquire);
                    *phase = InitPhase::InFlight {
                        waiter: rx.clone(),
                        generation,
                    };
                    tokio::spawn(Arc::clone(self).run(tx, generation));
                    (rx, generation)
                }
            }
        };

        let outcome = waiter
            .wait_for(Option::is_some)
            .await
            .map(|subscription| subscription.clone());

        match outcome {
            Ok(Some(subscription)) => subscription,
            Ok(None) | Err(_) => {
                tracing::error!("Auth initialization task ended without a result");
                if self.reset_phase_for(generation) {
                    self.fail_initialization();
                }
                Subscription::noop()
            }
        }
    }

    /// Tear down: cancel timers, stop the listener, forget the cached result.
    ///
    /// A run still in flight is discarded when it completes.
    pub fn shutdown(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(failsafes) = lock(&self.failsafes).take() {
            failsafes.cancel();
        }
        if let Some(live) = lock(&self.live).take() {
            live.unsubscribe();
        }
        *lock(&self.phase) = InitPhase::NotStarted;
        tracing::debug!("Auth coordinator shut down");
    }

    async fn run(self: Arc<Self>, done: watch::Sender<Option<Subscription>>, generation: u64) {
        let subscription = match self.start(generation).await {
            Ok(Some(subscription)) => {
                let cached = {
                    let mut phase = lock(&self.phase);
                    let current = self.is_current(generation);
                    if current {
                        *phase = InitPhase::Done(subscription.clone());
                    }
                    current
                };
                if cached {
                    tracing::info!(subscription = subscription.id(), "Auth initialized");
                    subscription
                } else {
                    tracing::debug!("Discarding initialization that outlived shutdown");
                    subscription.unsubscribe();
                    Subscription::noop()
                }
            }
            Ok(None) => {
                tracing::debug!("Discarding initialization that outlived shutdown");
                Subscription::noop()
            }
            Err(e) => {
                self.cancel_failsafes(generation);
                if self.reset_phase_for(generation) {
                    tracing::error!(error = %e, "Auth initialization failed");
                    self.fail_initialization();
                } else {
                    tracing::debug!(error = %e, "Stale auth initialization failed");
                }
                Subscription::noop()
            }
        };

        done.send_replace(Some(subscription));
    }

    /// Returns `Ok(None)` if a shutdown overtook this run.
    async fn start(self: &Arc<Self>, generation: u64) -> Result<Option<Subscription>> {
        let first_delivery = Arc::new(AtomicBool::new(false));
        if !self.arm_failsafes(generation, &first_delivery) {
            return Ok(None);
        }

        let hydrated = self.ctx.load_persisted().await;
        if !self.is_current(generation) {
            return Ok(None);
        }
        if let Some(user) = hydrated {
            tracing::debug!(user_id = %user.id, "Hydrated persisted user");
            self.ctx.update(|state| state.set_user(Some(user)));
        }

        let mut live = lock(&self.live);
        if !self.is_current(generation) {
            return Ok(None);
        }
        if let Some(previous) = live.take() {
            tracing::debug!(subscription = previous.id(), "Replacing live auth listener");
            previous.unsubscribe();
        }

        let stream = self.ctx.identity.auth_state_changes()?;
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        let listener = tokio::spawn(Arc::clone(self).listen(stream, first_delivery, generation));
        let subscription = Subscription::new(id, listener.abort_handle());

        *live = Some(subscription.clone());
        Ok(Some(subscription))
    }

    async fn listen(
        self: Arc<Self>,
        mut stream: AuthStateStream,
        first_delivery: Arc<AtomicBool>,
        generation: u64,
    ) {
        while let Some(item) = stream.next().await {
            match item {
                Ok(user) => {
                    let first = !first_delivery.swap(true, Ordering::AcqRel);
                    if first {
                        self.cancel_failsafes(generation);
                    }
                    self.ctx.apply_auth_state(user, first).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Auth state stream error ignored");
                }
            }
        }
        tracing::debug!("Auth state stream ended");
    }

    /// Arm both timers unless a shutdown overtook `generation`.
    fn arm_failsafes(&self, generation: u64, first_delivery: &Arc<AtomicBool>) -> bool {
        let mut slot = lock(&self.failsafes);
        if !self.is_current(generation) {
            return false;
        }

        let soft = {
            let ctx = Arc::clone(&self.ctx);
            let first_delivery = Arc::clone(first_delivery);
            let delay = ctx.config.soft_failsafe;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if !first_delivery.load(Ordering::Acquire) {
                    tracing::warn!(?delay, "No auth state from provider, using known state");
                    ctx.update(|state| state.mark_initialized());
                }
            })
        };

        let hard = {
            let ctx = Arc::clone(&self.ctx);
            let delay = ctx.config.hard_failsafe;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                tracing::warn!(?delay, "Hard auth failsafe fired");
                ctx.update(|state| state.mark_initialized());
            })
        };

        let armed = Failsafes {
            generation,
            soft: soft.abort_handle(),
            hard: hard.abort_handle(),
        };
        if let Some(stale) = slot.replace(armed) {
            stale.cancel();
        }
        true
    }

    /// Cancel the timers armed by `generation`; newer timers are left alone.
    fn cancel_failsafes(&self, generation: u64) {
        if let Some(failsafes) = lock(&self.failsafes).take_if(|f| f.generation == generation) {
            failsafes.cancel();
        }
    }

    /// Forget the in-flight run of `generation` so the next call retries.
    ///
    /// Returns `false` if the phase already belongs to another run.
    fn reset_phase_for(&self, generation: u64) -> bool {
        let mut phase = lock(&self.phase);
        let owned = self.is_current(generation)
            && matches!(&*phase, InitPhase::InFlight { generation: g, .. } if *g == generation);
        if owned {
            *phase = InitPhase::NotStarted;
        }
        owned
    }

    fn fail_initialization(&self) {
        self.ctx.update(|state| {
            state.mark_initialized();
            state.error = Some(INIT_FAILURE_MESSAGE.to_string());
        });
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }
}
