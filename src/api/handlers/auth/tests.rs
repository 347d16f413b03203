//! Flow-level tests that walk the login sequence without a database:
//! the state machine, the attempt store, and the TOTP engine together.

use std::time::Duration;

use super::machine::{CodeOutcome, LoginStage, PasswordOutcome};
use super::state::{AuthConfig, AuthState, LoginFlows};
use crate::totp::TotpEngine;

fn auth_state() -> AuthState {
    AuthState::new(AuthConfig::new("https://atelier.dev".to_string()))
}

#[tokio::test]
async fn first_login_enrolls_then_authenticates() {
    let state = auth_state();
    let now = 1_700_000_000;

    // Password matched, no confirmed secret: enrollment path.
    let stage = LoginStage::AwaitingPassword.on_password(PasswordOutcome::Match, false);
    assert_eq!(stage, LoginStage::AwaitingEnrollmentAck);
    let login_id = state.flows().store(stage, true).await;

    // Serve the QR: the attempt survives under the same handle.
    let attempt = state.flows().take(login_id).await.expect("attempt");
    assert_eq!(attempt.stage, LoginStage::AwaitingEnrollmentAck);
    let secret = TotpEngine::generate_secret();
    state.flows().restore(login_id, attempt).await;

    // Submit the first code: ack + verification in one step.
    let attempt = state.flows().take(login_id).await.expect("attempt");
    assert!(attempt.enrolling);
    let stage = attempt.stage.on_enrollment_ack();
    assert_eq!(stage, LoginStage::AwaitingTotp);

    let code = state.totp().code_at(&secret, now).expect("code");
    let outcome = if state.totp().verify_at(&secret, &code, now).expect("verify") {
        CodeOutcome::Valid
    } else {
        CodeOutcome::Invalid
    };
    assert_eq!(stage.on_totp(outcome), LoginStage::Authenticated);
}

#[tokio::test]
async fn established_login_rejects_a_wrong_code() {
    let state = auth_state();
    let now = 1_700_000_000;
    let secret = TotpEngine::generate_secret();

    let stage = LoginStage::AwaitingPassword.on_password(PasswordOutcome::Match, true);
    assert_eq!(stage, LoginStage::AwaitingTotp);
    let login_id = state.flows().store(stage, false).await;

    let attempt = state.flows().take(login_id).await.expect("attempt");
    let good = state.totp().code_at(&secret, now).expect("code");
    let wrong = if good == "000000" { "000001" } else { "000000" };
    assert!(!state.totp().verify_at(&secret, wrong, now).expect("verify"));
    assert_eq!(
        attempt.stage.on_totp(CodeOutcome::Invalid),
        LoginStage::Rejected
    );

    // The attempt is consumed; the handle cannot be replayed.
    assert!(state.flows().take(login_id).await.is_none());
}

#[tokio::test]
async fn stale_attempts_force_a_restart() {
    let flows = LoginFlows::new(Duration::ZERO);
    let login_id = flows.store(LoginStage::AwaitingTotp, false).await;
    std::thread::sleep(Duration::from_millis(5));
    assert!(flows.take(login_id).await.is_none());
}

#[tokio::test]
async fn unknown_handles_are_rejected() {
    let state = auth_state();
    assert!(state.flows().take(uuid::Uuid::new_v4()).await.is_none());
}
