//! Session state transitions driven by real backend signals: authorization,
//! the registration and moderation gates, and the
//! moderation-pending-counts-as-success rule for registration.

use kiosk_core::RegisterProfile;
use kiosk_integration_tests::{AuthScript, BackendScript, RegisterScript, TestHarness};
use kiosk_storefront::{ApiError, AuthState};

fn profile() -> RegisterProfile {
    RegisterProfile::from_form("Doe", "Jane", "", "9123456789", "jane@example.com")
        .expect("valid profile")
}

#[tokio::test]
async fn test_successful_auth_authorizes_session() {
    let h = TestHarness::start(BackendScript::default()).await;
    assert_eq!(h.session.state(), AuthState::Uninitialized);

    assert!(h.session.check_auth().await);
    assert_eq!(h.session.state(), AuthState::Authorized);
    assert!(h.session.token().is_some());
}

#[tokio::test]
async fn test_registration_required_signal_gates_session() {
    let script = BackendScript {
        auth: AuthScript::RegistrationRequired,
        ..BackendScript::default()
    };
    let h = TestHarness::start(script).await;

    assert!(!h.session.check_auth().await);
    assert_eq!(h.session.state(), AuthState::RegistrationRequired);
    assert!(h.session.token().is_none());
}

#[tokio::test]
async fn test_moderation_pending_signal_gates_session() {
    let script = BackendScript {
        auth: AuthScript::ModerationPending,
        ..BackendScript::default()
    };
    let h = TestHarness::start(script).await;

    assert!(!h.session.check_auth().await);
    assert_eq!(h.session.state(), AuthState::ModerationPending);
}

#[tokio::test]
async fn test_plain_rejection_leaves_session_unauthorized() {
    let script = BackendScript {
        auth: AuthScript::Reject,
        ..BackendScript::default()
    };
    let h = TestHarness::start(script).await;

    assert!(!h.session.check_auth().await);
    assert_eq!(h.session.state(), AuthState::Unauthorized);
}

#[tokio::test]
async fn test_accepted_registration_authorizes_session() {
    let h = TestHarness::start(BackendScript::default()).await;

    h.session.register(&profile()).await.expect("registration");

    assert_eq!(h.session.state(), AuthState::Authorized);
    assert_eq!(
        h.backend.state.register_calls.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn test_moderation_pending_registration_counts_as_success() {
    // The backend answers the registration itself with code 102 and keeps
    // answering auth the same way: the account exists, it is just not
    // approved yet.
    let script = BackendScript {
        auth: AuthScript::ModerationPending,
        register: RegisterScript::ModerationPending,
        ..BackendScript::default()
    };
    let h = TestHarness::start(script).await;

    h.session
        .register(&profile())
        .await
        .expect("moderation pending is not a registration failure");

    assert_eq!(h.session.state(), AuthState::ModerationPending);
}

#[tokio::test]
async fn test_rejected_registration_propagates() {
    let script = BackendScript {
        register: RegisterScript::Reject {
            message: "phone already registered".to_string(),
        },
        ..BackendScript::default()
    };
    let h = TestHarness::start(script).await;

    let err = h
        .session
        .register(&profile())
        .await
        .expect_err("rejection must propagate");

    assert!(matches!(err, ApiError::RegistrationFailed(m) if m.contains("already registered")));
    // The session was not re-checked; the gate decision stays with the caller.
    assert_eq!(h.session.state(), AuthState::Uninitialized);
}
