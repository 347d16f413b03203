//! Auth handlers and supporting modules.
//!
//! This module owns the multi-step admin login sequence and everything a
//! request needs along the way.
//!
//! ## Login Sequence
//!
//! - `POST /v1/auth/password` — check the password, open a login attempt.
//! - `GET /v1/auth/setup-2fa` — first login only: generate a pending secret
//!   and serve its QR code.
//! - `POST /v1/auth/verify-totp` — check the 6-digit code, confirm a pending
//!   secret, issue the session cookie.
//! - `POST /v1/auth/logout` / `GET /v1/auth/check` — session management.
//!
//! ## Rate Limiting
//!
//! Every password and code submission registers in `login_attempts`:
//! 10 per IP and 20 globally per rolling 10 minutes, with a 15-minute
//! cooldown after 3 consecutive failures. There is a single administrator,
//! so a global limit is meaningful.
//!
//! ## In-Flight Attempts
//!
//! Between the password step and its terminal stage, an attempt lives
//! server-side under a short TTL and a random handle. Attempts are single
//! use; any failure throws the client back to the password step.

pub(crate) mod enroll;
pub(crate) mod guard;
pub(crate) mod machine;
pub(crate) mod password;
mod rate_limit;
pub(crate) mod session;
mod state;
mod storage;
pub(crate) mod types;
mod utils;
pub(crate) mod verify;

pub use guard::AdminContext;
pub use rate_limit::LoginRateLimiter;
pub use state::{AuthConfig, AuthState};

#[cfg(test)]
mod tests;
