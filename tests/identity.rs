//! Session resolution, credential checks and protected-route gating.

mod common;

use common::{anonymous_gate, principal, signed_in_gate, FakeProvider};
use pdf2audio_client::{
    AuthError, ClientError, GuardDecision, IdentityGate, Navigator, Notice, Route, RouteGuard,
    SessionStatus, ValidationError,
};
use std::sync::atomic::Ordering;
use std::time::Duration;

#[tokio::test]
async fn session_is_unresolved_until_provider_reports() {
    let (provider, tx) = FakeProvider::new();
    let gate = IdentityGate::start(provider);

    assert!(!gate.is_resolved());
    assert_eq!(gate.session().status(), SessionStatus::Unresolved);
    assert!(gate.identity().is_none());

    let pending = tokio::time::timeout(Duration::from_millis(50), gate.wait_resolved()).await;
    assert!(pending.is_err(), "resolved without any notification");

    tx.send(Some(principal("ada"))).unwrap();
    let session = gate.wait_resolved().await.unwrap();
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.email(), Some("ada@example.com"));
    assert_eq!(gate.identity().unwrap().bearer_token, "token-ada");
}

#[tokio::test]
async fn guard_never_redirects_while_unresolved() {
    let (provider, tx) = FakeProvider::new();
    let gate = IdentityGate::start(provider);
    let mut guard = RouteGuard::new();
    let mut nav = Navigator::new();
    nav.push(Route::Dashboard.path());

    for _ in 0..3 {
        assert_eq!(
            guard.evaluate(&gate.session(), Route::Dashboard.path(), &mut nav),
            GuardDecision::Waiting
        );
    }
    assert_eq!(nav.current(), "/dashboard");

    tx.send(None).unwrap();
    let session = gate.wait_resolved().await.unwrap();
    assert_eq!(
        guard.evaluate(&session, Route::Dashboard.path(), &mut nav),
        GuardDecision::Redirected {
            from: "/dashboard".into()
        }
    );
    assert_eq!(nav.current(), "/login");
    assert_eq!(nav.return_target(), Some("/dashboard"));

    // A re-render must not stack another redirect.
    let depth = nav.history().len();
    guard.evaluate(&session, Route::Dashboard.path(), &mut nav);
    assert_eq!(nav.history().len(), depth);
}

#[tokio::test]
async fn sign_in_returns_to_the_protected_view() {
    let (gate, _provider, _tx) = anonymous_gate().await;
    let mut guard = RouteGuard::new();
    let mut nav = Navigator::new();
    nav.push("/dashboard");
    guard.evaluate(&gate.session(), "/dashboard", &mut nav);
    assert_eq!(nav.current(), "/login");

    let session = gate.authenticate("ada@example.com", "whatever").await.unwrap();
    assert!(session.is_authenticated());
    assert!(gate.session().is_authenticated());

    assert_eq!(nav.complete_sign_in(), "/dashboard");
    assert_eq!(nav.current(), "/dashboard");
    assert_eq!(
        guard.evaluate(&gate.session(), "/dashboard", &mut nav),
        GuardDecision::Admit
    );
}

#[tokio::test]
async fn local_sign_in_before_resolution_is_not_applied() {
    let (provider, tx) = FakeProvider::new();
    let gate = IdentityGate::start(provider.clone());

    let returned = gate.authenticate("ada@example.com", "Secret1").await.unwrap();
    assert!(returned.is_authenticated());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(gate.session().status(), SessionStatus::Unresolved);

    tx.send(None).unwrap();
    let session = gate.wait_resolved().await.unwrap();
    assert_eq!(session.status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn later_notifications_override_local_state() {
    let (gate, _provider, tx) = signed_in_gate("ada").await;
    let mut rx = gate.subscribe();

    tx.send(None).unwrap();
    rx.wait_for(|s| s.status() == SessionStatus::Anonymous)
        .await
        .unwrap();
    assert!(gate.identity().is_none());

    tx.send(Some(principal("bob"))).unwrap();
    let session = rx.wait_for(|s| s.is_authenticated()).await.unwrap().clone();
    assert_eq!(session.principal().unwrap().uid, "bob");
}

#[tokio::test]
async fn weak_secrets_never_reach_the_provider() {
    let (gate, provider, _tx) = anonymous_gate().await;

    let err = gate.register("ada@example.com", "abc").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::SecretTooShort { min: 6, actual: 3 })
    ));
    assert!(matches!(err.notice(), Notice::Inline { field: "password", .. }));
    assert!(err.is_local());

    let err = gate.register("ada@example.com", "abcdefgh").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::SecretMissingUppercase)
    ));

    let err = gate.register("   ", "Secret1").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::EmptyIdentifier)
    ));

    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(gate.session().status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn register_signs_the_user_in() {
    let (gate, provider, _tx) = anonymous_gate().await;

    let session = gate.register("ada@example.com", "Secret1").await.unwrap();
    assert!(session.is_authenticated());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(gate.session().email(), Some("ada@example.com"));
}

#[tokio::test]
async fn rejected_credentials_leave_the_session_alone() {
    let (gate, provider, _tx) = anonymous_gate().await;
    provider.reject.store(true, Ordering::SeqCst);

    let err = gate
        .authenticate("ada@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Auth(AuthError::Rejected { .. })));
    assert!(matches!(err.notice(), Notice::Toast { .. }));
    assert_eq!(gate.session().status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn federated_sign_in() {
    let (gate, _provider, _tx) = anonymous_gate().await;
    let session = gate.authenticate_with_federated_provider().await.unwrap();
    assert_eq!(session.principal().unwrap().uid, "google-user");
    assert!(gate.session().is_authenticated());
}

#[tokio::test]
async fn sign_out_succeeds_locally_when_the_provider_fails() {
    let (gate, provider, _tx) = signed_in_gate("ada").await;
    provider.fail_sign_out.store(true, Ordering::SeqCst);

    gate.sign_out().await;

    assert_eq!(provider.sign_out_calls.load(Ordering::SeqCst), 1);
    assert_eq!(gate.session().status(), SessionStatus::Anonymous);
    assert!(gate.identity().is_none());
}

#[tokio::test]
async fn sign_out_while_anonymous_is_harmless() {
    let (gate, _provider, _tx) = anonymous_gate().await;
    let mut rx = gate.subscribe();
    rx.mark_unchanged();

    gate.sign_out().await;

    assert!(!rx.has_changed().unwrap());
    assert_eq!(gate.session().status(), SessionStatus::Anonymous);
}
