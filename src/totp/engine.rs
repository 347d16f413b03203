use std::time::{SystemTime, UNIX_EPOCH};

use subtle::ConstantTimeEq;
use totp_rs::{Algorithm, Secret, TOTP};

/// Code length; six digits is what every authenticator app expects.
pub const DIGITS: usize = 6;

/// RFC 6238 time step.
pub const STEP_SECONDS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum TotpError {
    #[error("Invalid base32 secret")]
    InvalidSecret,
    #[error("Failed to build TOTP context")]
    Context,
    #[error("Failed to render enrollment QR code")]
    Qr,
    #[error("System clock is before the Unix epoch")]
    Clock,
}

/// Stateless TOTP operations bound to an issuer/account pair.
///
/// The issuer and account label only matter for the provisioning URI shown
/// during enrollment; verification depends on the secret and the clock.
#[derive(Clone, Debug)]
pub struct TotpEngine {
    issuer: String,
    account: String,
}

impl TotpEngine {
    #[must_use]
    pub fn new(issuer: String, account: String) -> Self {
        Self { issuer, account }
    }

    /// Generate a fresh base32 secret (160 bits of OS randomness).
    #[must_use]
    pub fn generate_secret() -> String {
        Secret::generate_secret().to_encoded().to_string()
    }

    fn context(&self, secret: &str) -> Result<TOTP, TotpError> {
        let secret_bytes = Secret::Encoded(secret.to_string())
            .to_bytes()
            .map_err(|_| TotpError::InvalidSecret)?;

        TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            1,
            STEP_SECONDS,
            secret_bytes,
            Some(self.issuer.clone()),
            self.account.clone(),
        )
        .map_err(|_| TotpError::Context)
    }

    /// Build the `otpauth://totp/...` URI an authenticator app scans.
    ///
    /// # Errors
    /// Fails if the secret is not valid base32.
    pub fn provisioning_uri(&self, secret: &str) -> Result<String, TotpError> {
        Ok(self.context(secret)?.get_url())
    }

    /// Render the provisioning URI as a PNG data URL for inline display.
    ///
    /// # Errors
    /// Fails if the secret is invalid or QR rendering fails.
    pub fn qr_data_url(&self, secret: &str) -> Result<String, TotpError> {
        let qr = self
            .context(secret)?
            .get_qr_base64()
            .map_err(|_| TotpError::Qr)?;
        Ok(format!("data:image/png;base64,{qr}"))
    }

    /// Verify a code against the current clock.
    ///
    /// # Errors
    /// Fails if the secret is invalid or the clock is unreadable.
    pub fn verify(&self, secret: &str, code: &str) -> Result<bool, TotpError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TotpError::Clock)?
            .as_secs();
        self.verify_at(secret, code, now)
    }

    /// Verify a code at an explicit Unix timestamp.
    ///
    /// Accepts the window containing `now` plus the immediately preceding
    /// and following windows, the standard tolerance for clock skew. Codes
    /// that are not exactly six ASCII digits never match.
    ///
    /// # Errors
    /// Fails if the secret is not valid base32.
    pub fn verify_at(&self, secret: &str, code: &str, now: u64) -> Result<bool, TotpError> {
        if code.len() != DIGITS || !code.bytes().all(|byte| byte.is_ascii_digit()) {
            return Ok(false);
        }

        let totp = self.context(secret)?;
        let windows = [
            now.saturating_sub(STEP_SECONDS),
            now,
            now.saturating_add(STEP_SECONDS),
        ];

        let mut matched = false;
        for window in windows {
            let expected = totp.generate(window);
            // Constant-time comparison; do not short-circuit on the first hit.
            matched |= bool::from(code.as_bytes().ct_eq(expected.as_bytes()));
        }
        Ok(matched)
    }

    /// The code for an explicit timestamp. Test and enrollment tooling only.
    ///
    /// # Errors
    /// Fails if the secret is not valid base32.
    pub fn code_at(&self, secret: &str, time: u64) -> Result<String, TotpError> {
        Ok(self.context(secret)?.generate(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    const SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";

    fn engine() -> TotpEngine {
        TotpEngine::new("Atelier Admin".to_string(), "admin".to_string())
    }

    #[test]
    fn generated_secrets_are_base32_with_enough_entropy() {
        let secret = TotpEngine::generate_secret();
        let bytes = Secret::Encoded(secret.clone()).to_bytes().expect("base32");
        assert!(bytes.len() * 8 >= 160, "expected at least 160 bits");
        assert!(
            secret
                .chars()
                .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
        );
    }

    #[test]
    fn generated_secrets_do_not_repeat() {
        assert_ne!(TotpEngine::generate_secret(), TotpEngine::generate_secret());
    }

    #[test]
    fn accepts_adjacent_windows_only() {
        let engine = engine();
        let now = 1_700_000_010; // mid-window
        let code = engine.code_at(SECRET, now).expect("code");

        assert!(engine.verify_at(SECRET, &code, now).expect("verify"));
        assert!(
            engine
                .verify_at(SECRET, &code, now - STEP_SECONDS)
                .expect("verify")
        );
        assert!(
            engine
                .verify_at(SECRET, &code, now + STEP_SECONDS)
                .expect("verify")
        );
        assert!(
            !engine
                .verify_at(SECRET, &code, now - 2 * STEP_SECONDS)
                .expect("verify")
        );
        assert!(
            !engine
                .verify_at(SECRET, &code, now + 2 * STEP_SECONDS)
                .expect("verify")
        );
    }

    #[test]
    fn rejects_codes_that_are_not_six_digits() {
        let engine = engine();
        let now = 1_700_000_010;
        let code = engine.code_at(SECRET, now).expect("code");

        assert!(!engine.verify_at(SECRET, &code[..5], now).expect("verify"));
        let padded = format!("{code}0");
        assert!(!engine.verify_at(SECRET, &padded, now).expect("verify"));
        assert!(!engine.verify_at(SECRET, "12345a", now).expect("verify"));
        assert!(!engine.verify_at(SECRET, "", now).expect("verify"));
    }

    #[test]
    fn rejects_wrong_code() {
        let engine = engine();
        let now = 1_700_000_010;
        let code = engine.code_at(SECRET, now).expect("code");
        // Flip one digit.
        let mut wrong = code.into_bytes();
        wrong[0] = if wrong[0] == b'9' { b'0' } else { wrong[0] + 1 };
        let wrong = String::from_utf8(wrong).expect("digits");
        assert!(!engine.verify_at(SECRET, &wrong, now).expect("verify"));
    }

    #[test]
    fn invalid_secret_is_an_error() {
        let engine = engine();
        assert!(matches!(
            engine.verify_at("not base32!", "123456", 0),
            Err(TotpError::InvalidSecret)
        ));
    }

    #[test]
    fn provisioning_uri_round_trips_the_secret() {
        let engine = engine();
        let uri = engine.provisioning_uri(SECRET).expect("uri");
        assert!(uri.starts_with("otpauth://totp/"));

        let parsed = Url::parse(&uri).expect("parse otpauth uri");
        let secret = parsed
            .query_pairs()
            .find(|(key, _)| key == "secret")
            .map(|(_, value)| value.to_string());
        assert_eq!(secret.as_deref(), Some(SECRET));

        let issuer = parsed
            .query_pairs()
            .find(|(key, _)| key == "issuer")
            .map(|(_, value)| value.to_string());
        assert_eq!(issuer.as_deref(), Some("Atelier Admin"));
    }

    #[test]
    fn qr_data_url_has_png_prefix() {
        let engine = engine();
        let qr = engine.qr_data_url(SECRET).expect("qr");
        assert!(qr.starts_with("data:image/png;base64,"));
    }
}
