//! Login attempt state machine.
//!
//! Flow Overview:
//! 1) `AwaitingPassword` — the password is checked against the stored hash.
//! 2) `AwaitingEnrollmentAck` — first login only: a pending secret has been
//!    generated and the QR code presented; the administrator confirms it was
//!    scanned.
//! 3) `AwaitingTotp` — a 6-digit code is checked.
//! 4) `Authenticated` / `Rejected` — terminal. A rejected attempt is never
//!    retried in place; the client restarts from the password step.
//!
//! Transitions are pure; the HTTP handlers feed in outcomes and act on the
//! resulting stage.

/// Stage of a single login attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginStage {
    AwaitingPassword,
    AwaitingEnrollmentAck,
    AwaitingTotp,
    Authenticated,
    Rejected,
}

/// Result of the password check, as reported by the credential store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasswordOutcome {
    Match,
    Mismatch,
}

/// Result of the TOTP check, as reported by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeOutcome {
    Valid,
    Invalid,
}

impl LoginStage {
    /// Apply the password outcome. `enrolled` is whether a confirmed TOTP
    /// secret already exists; a matching password routes first logins
    /// through enrollment.
    #[must_use]
    pub fn on_password(self, outcome: PasswordOutcome, enrolled: bool) -> Self {
        match (self, outcome) {
            (Self::AwaitingPassword, PasswordOutcome::Match) if enrolled => Self::AwaitingTotp,
            (Self::AwaitingPassword, PasswordOutcome::Match) => Self::AwaitingEnrollmentAck,
            _ => Self::Rejected,
        }
    }

    /// The administrator confirmed the QR code was scanned. Unconditional:
    /// possession of the secret is only proven by the first valid code.
    #[must_use]
    pub fn on_enrollment_ack(self) -> Self {
        match self {
            Self::AwaitingEnrollmentAck => Self::AwaitingTotp,
            _ => Self::Rejected,
        }
    }

    /// Apply the TOTP outcome.
    #[must_use]
    pub fn on_totp(self, outcome: CodeOutcome) -> Self {
        match (self, outcome) {
            (Self::AwaitingTotp, CodeOutcome::Valid) => Self::Authenticated,
            _ => Self::Rejected,
        }
    }

    /// Terminal stages accept no further input.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Authenticated | Self::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::{CodeOutcome, LoginStage, PasswordOutcome};

    #[test]
    fn first_login_walks_through_enrollment() {
        let stage = LoginStage::AwaitingPassword.on_password(PasswordOutcome::Match, false);
        assert_eq!(stage, LoginStage::AwaitingEnrollmentAck);

        let stage = stage.on_enrollment_ack();
        assert_eq!(stage, LoginStage::AwaitingTotp);

        let stage = stage.on_totp(CodeOutcome::Valid);
        assert_eq!(stage, LoginStage::Authenticated);
        assert!(stage.is_terminal());
    }

    #[test]
    fn enrolled_login_skips_enrollment() {
        let stage = LoginStage::AwaitingPassword.on_password(PasswordOutcome::Match, true);
        assert_eq!(stage, LoginStage::AwaitingTotp);

        let stage = stage.on_totp(CodeOutcome::Valid);
        assert_eq!(stage, LoginStage::Authenticated);
    }

    #[test]
    fn password_mismatch_rejects() {
        let stage = LoginStage::AwaitingPassword.on_password(PasswordOutcome::Mismatch, true);
        assert_eq!(stage, LoginStage::Rejected);
        assert!(stage.is_terminal());

        let stage = LoginStage::AwaitingPassword.on_password(PasswordOutcome::Mismatch, false);
        assert_eq!(stage, LoginStage::Rejected);
    }

    #[test]
    fn invalid_code_rejects() {
        let stage = LoginStage::AwaitingTotp.on_totp(CodeOutcome::Invalid);
        assert_eq!(stage, LoginStage::Rejected);
    }

    #[test]
    fn out_of_order_inputs_reject() {
        // Code before password.
        assert_eq!(
            LoginStage::AwaitingPassword.on_totp(CodeOutcome::Valid),
            LoginStage::Rejected
        );
        // Ack without pending enrollment.
        assert_eq!(
            LoginStage::AwaitingTotp.on_enrollment_ack(),
            LoginStage::Rejected
        );
        // Password resubmission mid-flow.
        assert_eq!(
            LoginStage::AwaitingTotp.on_password(PasswordOutcome::Match, true),
            LoginStage::Rejected
        );
    }

    #[test]
    fn terminal_stages_swallow_everything() {
        for stage in [LoginStage::Authenticated, LoginStage::Rejected] {
            assert!(stage.is_terminal());
            assert_eq!(
                stage.on_password(PasswordOutcome::Match, true),
                LoginStage::Rejected
            );
            assert_eq!(stage.on_enrollment_ack(), LoginStage::Rejected);
            assert_eq!(stage.on_totp(CodeOutcome::Valid), LoginStage::Rejected);
        }
    }
}
