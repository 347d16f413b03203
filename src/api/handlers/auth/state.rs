//! Auth configuration and in-flight login attempt tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::machine::LoginStage;
use crate::totp::TotpEngine;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_LOGIN_TTL_SECONDS: u64 = 5 * 60;
const DEFAULT_TOTP_ISSUER: &str = "Atelier Admin";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_ttl_seconds: i64,
    login_ttl_seconds: u64,
    totp_issuer: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            login_ttl_seconds: DEFAULT_LOGIN_TTL_SECONDS,
            totp_issuer: DEFAULT_TOTP_ISSUER.to_string(),
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_login_ttl_seconds(mut self, seconds: u64) -> Self {
        self.login_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_totp_issuer(mut self, issuer: String) -> Self {
        self.totp_issuer = issuer;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    /// Login entry point used when redirecting unauthenticated browsers.
    pub(crate) fn login_url(&self) -> String {
        let base = self.frontend_base_url.trim_end_matches('/');
        format!("{base}/admin/login")
    }

    #[must_use]
    pub fn totp_issuer(&self) -> &str {
        &self.totp_issuer
    }

    #[must_use]
    pub fn login_ttl_seconds(&self) -> u64 {
        self.login_ttl_seconds
    }

    pub(crate) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

/// A login attempt between the password step and its terminal stage.
#[derive(Debug)]
pub(crate) struct LoginAttempt {
    pub(crate) stage: LoginStage,
    /// True while the attempt carries an unconfirmed, freshly enrolled secret.
    pub(crate) enrolling: bool,
    created_at: Instant,
}

/// Server-side store of in-flight login attempts, purged by TTL.
///
/// Attempts are single-use: handlers `take` them, and only a surviving
/// non-terminal attempt is put back. Losing one (expiry, restart) just
/// forces the client to start over from the password step.
pub struct LoginFlows {
    ttl: Duration,
    attempts: Mutex<HashMap<Uuid, LoginAttempt>>,
}

impl LoginFlows {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) async fn store(&self, stage: LoginStage, enrolling: bool) -> Uuid {
        let login_id = Uuid::new_v4();
        let mut attempts = self.attempts.lock().await;
        attempts.retain(|_, attempt| attempt.created_at.elapsed() < self.ttl);
        attempts.insert(
            login_id,
            LoginAttempt {
                stage,
                enrolling,
                created_at: Instant::now(),
            },
        );
        login_id
    }

    pub(crate) async fn take(&self, login_id: Uuid) -> Option<LoginAttempt> {
        let mut attempts = self.attempts.lock().await;
        if let Some(attempt) = attempts.remove(&login_id)
            && attempt.created_at.elapsed() < self.ttl
        {
            Some(attempt)
        } else {
            None
        }
    }

    /// Put an attempt back under the same id, e.g. after serving the
    /// enrollment QR while still awaiting the acknowledgment.
    pub(crate) async fn restore(&self, login_id: Uuid, attempt: LoginAttempt) {
        let mut attempts = self.attempts.lock().await;
        attempts.insert(login_id, attempt);
    }
}

pub struct AuthState {
    config: AuthConfig,
    flows: LoginFlows,
    totp: TotpEngine,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let flows = LoginFlows::new(Duration::from_secs(config.login_ttl_seconds()));
        let totp = TotpEngine::new(
            config.totp_issuer().to_string(),
            crate::credentials::ADMIN_ID.to_string(),
        );
        Self {
            config,
            flows,
            totp,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn flows(&self) -> &LoginFlows {
        &self.flows
    }

    pub(crate) fn totp(&self) -> &TotpEngine {
        &self.totp
    }
}
