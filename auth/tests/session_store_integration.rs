//! Integration tests for the session store actions.
//!
//! Each test wires the store to mock providers, an in-memory event bus and a
//! deterministic clock, then checks state, storage and emitted events together.

#![allow(clippy::unwrap_used, clippy::panic)] // Tests can unwrap and panic

use auth_session::mocks::{MockIdentityProvider, MockPersistence};
use auth_session::{
    AuthError, AuthEvent, LogoutReason, ProviderKind, Role, SessionConfig, SessionStore, User,
    UserId, get_auth_error_message,
};
use auth_session_core::environment::Clock;
use auth_session_testing::{InMemoryEventBus, ManualClock, init_tracing, test_clock};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

const STORAGE_KEY: &str = "auth-session";

struct Harness {
    store: SessionStore<MockIdentityProvider, MockPersistence>,
    persistence: MockPersistence,
    bus: Arc<InMemoryEventBus>,
}

fn create_harness(identity: MockIdentityProvider, clock: Arc<dyn Clock>) -> Harness {
    init_tracing();
    let persistence = MockPersistence::new();
    let bus = Arc::new(InMemoryEventBus::new());
    let store = SessionStore::new(
        identity,
        persistence.clone(),
        bus.clone(),
        clock,
        SessionConfig::default(),
    );
    Harness {
        store,
        persistence,
        bus,
    }
}

fn harness_with(identity: MockIdentityProvider) -> Harness {
    create_harness(identity, Arc::new(test_clock()))
}

fn tokened_customer() -> User {
    User::new("u1", Role::Customer, ProviderKind::Email)
        .with_email("a@b.com")
        .with_token("secret-id-token", test_clock().now() + chrono::Duration::hours(1))
}

// ═══════════════════════════════════════════════════════════════════════
// Sign-in and sign-up
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_email_sign_in_success() {
    let h = harness_with(MockIdentityProvider::new().with_user(tokened_customer()));

    let user = h.store.sign_in_with_email("a@b.com", "pw").await.unwrap();

    assert_eq!(user.id, UserId::new("u1"));
    let state = h.store.state();
    assert!(state.is_authenticated);
    assert!(!state.is_loading);
    assert!(state.error.is_none());
    assert_eq!(state.user.unwrap().role, Role::Customer);

    let logged_in = h.bus.events_of_type("USER_LOGGED_IN");
    assert_eq!(logged_in.len(), 1);
    match logged_in[0].decode::<AuthEvent>().unwrap() {
        AuthEvent::UserLoggedIn {
            user_id,
            email,
            provider,
            ..
        } => {
            assert_eq!(user_id, UserId::new("u1"));
            assert_eq!(email.as_deref(), Some("a@b.com"));
            assert_eq!(provider, ProviderKind::Email);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(h.bus.published_to("auth-events").len(), 1);
}

#[tokio::test]
async fn test_persisted_snapshot_never_contains_token() {
    let h = harness_with(MockIdentityProvider::new().with_user(tokened_customer()));

    h.store.sign_in_with_email("a@b.com", "pw").await.unwrap();

    let raw = h.persistence.raw(STORAGE_KEY).unwrap();
    assert!(!raw.contains("secret-id-token"));

    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(json.get("idToken").is_none());
    assert!(json.get("tokenExpiry").is_none());
    assert_eq!(json["id"], "u1");
    assert_eq!(json["role"], "CUSTOMER");

    // The in-memory user keeps its token.
    assert_eq!(
        h.store.current_user().unwrap().id_token.as_deref(),
        Some("secret-id-token")
    );
}

#[tokio::test]
async fn test_wrong_password_records_translated_error() {
    let h = harness_with(MockIdentityProvider::new().failing_with("auth/wrong-password"));

    let err = assert_err!(h.store.sign_in_with_email("a@b.com", "bad").await);

    assert!(matches!(err, AuthError::Credential { .. }));
    assert_eq!(err.code(), "auth/wrong-password");

    let state = h.store.state();
    assert_eq!(
        state.error.as_deref(),
        Some("Incorrect password. Please try again.")
    );
    assert!(!state.is_loading);
    assert!(!state.is_authenticated);
    assert!(h.persistence.raw(STORAGE_KEY).is_none());

    let errors = h.bus.events_of_type("AUTH_ERROR");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].decode::<AuthEvent>().unwrap(),
        AuthEvent::AuthError {
            code: "auth/wrong-password".to_string(),
            message: "Incorrect password. Please try again.".to_string(),
        }
    );
    assert_eq!(h.bus.count_of("USER_LOGGED_IN"), 0);
}

#[tokio::test]
async fn test_cancelled_popup_is_silent_but_recorded() {
    let h = harness_with(MockIdentityProvider::new().failing_with("auth/popup-closed-by-user"));

    let err = h.store.sign_in_with_google().await.unwrap_err();

    assert!(err.is_silent());
    assert_eq!(
        h.store.state().error.as_deref(),
        Some(get_auth_error_message("auth/popup-closed-by-user"))
    );
    assert_eq!(h.bus.count_of("AUTH_ERROR"), 1);
}

#[tokio::test]
async fn test_unknown_code_uses_generic_message() {
    let h = harness_with(MockIdentityProvider::new().failing_with("auth/something-new"));

    let err = h.store.sign_in_with_github().await.unwrap_err();

    assert!(matches!(err, AuthError::Internal { .. }));
    assert_eq!(
        h.store.state().error.as_deref(),
        Some(get_auth_error_message("auth/anything-else"))
    );
}

#[tokio::test]
async fn test_sign_up_sets_display_name() {
    let h = harness_with(MockIdentityProvider::new());

    let user = h
        .store
        .sign_up_with_email("new@b.com", "pw", Some("New User"))
        .await
        .unwrap();

    assert_eq!(user.display_name.as_deref(), Some("New User"));
    assert_eq!(
        h.store.current_user().unwrap().display_name.as_deref(),
        Some("New User")
    );
    assert_eq!(h.bus.count_of("USER_LOGGED_IN"), 1);
}

#[tokio::test]
async fn test_oauth_sign_in_reports_provider() {
    let h = harness_with(MockIdentityProvider::new());

    let google = h.store.sign_in_with_google().await.unwrap();
    let github = h.store.sign_in_with_github().await.unwrap();

    assert_eq!(google.provider, ProviderKind::Google);
    assert_eq!(github.provider, ProviderKind::GitHub);
    assert_eq!(h.store.current_user().unwrap().provider, ProviderKind::GitHub);
    assert_eq!(h.bus.count_of("USER_LOGGED_IN"), 2);
}

#[tokio::test]
async fn test_new_action_clears_previous_error() {
    let identity = MockIdentityProvider::new();
    let h = harness_with(identity);
    h.store.set_error("stale");

    h.store.sign_in_with_email("a@b.com", "pw").await.unwrap();

    assert!(h.store.state().error.is_none());
}

#[tokio::test]
async fn test_storage_and_bus_failures_do_not_fail_sign_in() {
    let h = harness_with(MockIdentityProvider::new());
    h.persistence.set_write_failure(true);
    h.bus.set_publish_failure(true);

    let user = h.store.sign_in_with_email("a@b.com", "pw").await.unwrap();

    assert_eq!(h.store.current_user(), Some(user));
    assert!(h.store.state().error.is_none());
    assert!(h.persistence.raw(STORAGE_KEY).is_none());
    assert!(h.bus.published().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Password reset
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_reset_password_touches_only_loading_and_error() {
    let h = harness_with(MockIdentityProvider::new());

    assert_ok!(h.store.reset_password("a@b.com").await);

    let state = h.store.state();
    assert!(!state.is_loading);
    assert!(state.error.is_none());
    assert!(state.user.is_none());
    assert!(h.bus.published().is_empty());
}

#[tokio::test]
async fn test_reset_password_failure_emits_nothing() {
    let h = harness_with(MockIdentityProvider::new().failing_with("auth/user-not-found"));

    let err = h.store.reset_password("ghost@b.com").await.unwrap_err();

    assert_eq!(err.code(), "auth/user-not-found");
    assert_eq!(
        h.store.state().error.as_deref(),
        Some(get_auth_error_message("auth/user-not-found"))
    );
    assert!(h.bus.published().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Sign-out
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_sign_out_clears_session() {
    let h = harness_with(MockIdentityProvider::new().with_user(tokened_customer()));
    h.store.sign_in_with_email("a@b.com", "pw").await.unwrap();
    assert!(h.persistence.raw(STORAGE_KEY).is_some());

    assert_ok!(h.store.sign_out().await);

    let state = h.store.state();
    assert!(state.user.is_none());
    assert!(!state.is_authenticated);
    assert!(!state.is_loading);
    assert!(h.persistence.raw(STORAGE_KEY).is_none());

    let logged_out = h.bus.events_of_type("USER_LOGGED_OUT");
    assert_eq!(logged_out.len(), 1);
    assert_eq!(
        logged_out[0].decode::<AuthEvent>().unwrap(),
        AuthEvent::UserLoggedOut {
            reason: LogoutReason::UserInitiated
        }
    );
}

#[tokio::test]
async fn test_sign_out_failure_still_clears_local_session() {
    let identity = MockIdentityProvider::new()
        .with_user(tokened_customer())
        .failing_sign_out_with("auth/network-request-failed");
    let h = harness_with(identity);
    h.store.sign_in_with_email("a@b.com", "pw").await.unwrap();

    let err = assert_err!(h.store.sign_out().await);

    assert!(matches!(err, AuthError::Network { .. }));
    let state = h.store.state();
    assert!(state.user.is_none());
    assert!(!state.is_loading);
    assert_eq!(
        state.error.as_deref(),
        Some(get_auth_error_message("auth/network-request-failed"))
    );
    assert!(h.persistence.raw(STORAGE_KEY).is_none());
    assert_eq!(h.bus.count_of("USER_LOGGED_OUT"), 1);
    assert_eq!(h.bus.count_of("AUTH_ERROR"), 1);
}

// ═══════════════════════════════════════════════════════════════════════
// Token lifecycle
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_refresh_failure_changes_nothing() {
    let identity = MockIdentityProvider::new()
        .with_user(tokened_customer())
        .failing_refresh_with("auth/network-request-failed");
    let h = harness_with(identity);
    h.store.sign_in_with_email("a@b.com", "pw").await.unwrap();
    h.store.set_error("previous");
    let before = h.store.state();
    let mut rx = h.store.subscribe();
    rx.borrow_and_update();

    let token = h.store.refresh_token().await;

    assert!(token.is_none());
    assert!(!rx.has_changed().unwrap());
    assert_eq!(h.store.state(), before);
    assert_eq!(h.store.state().error.as_deref(), Some("previous"));
    assert_eq!(h.bus.count_of("AUTH_ERROR"), 0);
}

#[tokio::test]
async fn test_refresh_success_updates_token_and_expiry() {
    let identity = MockIdentityProvider::new()
        .with_user(tokened_customer())
        .with_refreshed_token("fresh-token");
    let h = harness_with(identity);
    h.store.sign_in_with_email("a@b.com", "pw").await.unwrap();

    let token = h.store.refresh_token().await;

    assert_eq!(token.as_deref(), Some("fresh-token"));
    let user = h.store.current_user().unwrap();
    assert_eq!(user.id_token.as_deref(), Some("fresh-token"));
    assert_eq!(
        user.token_expiry,
        Some(test_clock().now() + chrono::Duration::hours(1))
    );
    assert!(!h.persistence.raw(STORAGE_KEY).unwrap().contains("fresh-token"));
}

#[tokio::test]
async fn test_refresh_without_user_is_skipped() {
    let identity = MockIdentityProvider::new().with_refreshed_token("fresh-token");
    let h = harness_with(identity.clone());

    assert!(h.store.refresh_token().await.is_none());
    assert!(!identity.calls().contains(&"refresh_token"));
}

#[tokio::test]
async fn test_token_refresh_threshold_follows_clock() {
    let clock = ManualClock::new(test_clock().now());
    let identity = MockIdentityProvider::new()
        .with_user(tokened_customer())
        .with_refreshed_token("fresh-token");
    let h = create_harness(identity, Arc::new(clock.clone()));
    h.store.sign_in_with_email("a@b.com", "pw").await.unwrap();

    assert!(!h.store.needs_token_refresh());
    assert_eq!(h.store.id_token(false).await.as_deref(), Some("secret-id-token"));

    // 4 minutes left on the token: inside the 5 minute window.
    clock.advance(chrono::Duration::minutes(56));
    assert!(h.store.needs_token_refresh());
    assert_eq!(h.store.id_token(false).await.as_deref(), Some("fresh-token"));
    assert!(!h.store.needs_token_refresh());
}

#[tokio::test]
async fn test_forced_id_token_falls_back_on_refresh_failure() {
    let identity = MockIdentityProvider::new()
        .with_user(tokened_customer())
        .failing_refresh_with("auth/internal-error");
    let h = harness_with(identity);
    h.store.sign_in_with_email("a@b.com", "pw").await.unwrap();

    let token = h.store.id_token(true).await;

    assert_eq!(token.as_deref(), Some("secret-id-token"));
}

// ═══════════════════════════════════════════════════════════════════════
// Setters and role checks
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_direct_setters() {
    let h = harness_with(MockIdentityProvider::new());

    h.store.set_loading(false);
    h.store.set_error("boom");
    assert!(!h.store.state().is_loading);
    assert_eq!(h.store.state().error.as_deref(), Some("boom"));

    h.store.clear_error();
    assert!(h.store.state().error.is_none());
}

#[tokio::test]
async fn test_role_checks_follow_current_user() {
    let vendor = User::new("v1", Role::Vendor, ProviderKind::Email);
    let h = harness_with(MockIdentityProvider::new().with_user(vendor));

    assert!(!h.store.has_role(Role::Vendor));
    assert!(!h.store.has_any_role(&[Role::Vendor, Role::Admin]));

    h.store.sign_in_with_email("v@b.com", "pw").await.unwrap();

    assert!(h.store.has_role(Role::Vendor));
    assert!(!h.store.has_role(Role::Admin));
    assert!(h.store.has_any_role(&[Role::Admin, Role::Vendor]));
    assert!(!h.store.has_any_role(&[]));
    assert!(h.store.has_all_roles(&[Role::Vendor]));
    assert!(!h.store.has_all_roles(&[Role::Vendor, Role::Admin]));
    assert!(!h.store.has_all_roles(&[]));

    h.store.sign_out().await.unwrap();
    assert!(!h.store.has_role(Role::Vendor));
}

#[tokio::test]
async fn test_provider_user_reflects_provider_view() {
    let h = harness_with(MockIdentityProvider::new());
    assert!(h.store.provider_user().is_none());

    let user = h.store.sign_in_with_email("a@b.com", "pw").await.unwrap();
    assert_eq!(h.store.provider_user(), Some(user));

    h.store.sign_out().await.unwrap();
    assert!(h.store.provider_user().is_none());
}
