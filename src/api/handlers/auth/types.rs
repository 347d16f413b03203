//! Request/response types for auth endpoints.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Debug)]
pub struct PasswordLoginRequest {
    /// Redacted in Debug output; the plaintext never reaches a log line.
    #[schema(value_type = String)]
    pub password: SecretString,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PasswordLoginResponse {
    /// True when no confirmed TOTP secret exists yet and the client should
    /// fetch the enrollment QR next.
    pub is_first_login: bool,
    /// Handle for the rest of this login attempt.
    pub login_id: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct EnrollmentResponse {
    /// PNG data URL for inline display.
    pub qr_code: String,
    /// Same payload for manual entry.
    pub otpauth_uri: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyTotpRequest {
    pub login_id: String,
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionStatusResponse {
    pub authenticated: bool,
}
