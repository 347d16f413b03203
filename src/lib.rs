//! # Kustos (Admin Authentication for the Atelier sites)
//!
//! `kustos` owns the administrator login flow for the Atelier portfolio
//! sites and enforces the resulting session on the admin API. Content
//! management itself (posts, albums, uploads) lives in the site backends;
//! only authentication is handled here.
//!
//! ## Login Flow
//!
//! 1. **Password** — the administrator submits the password, which is
//!    checked against the stored Argon2 hash.
//! 2. **Enrollment (first login only)** — when no confirmed TOTP secret
//!    exists, a fresh secret is generated and presented as an `otpauth://`
//!    QR code. The secret stays *pending* until the first valid code.
//! 3. **TOTP** — a 6-digit RFC 6238 code is verified with a one-step
//!    tolerance window on either side.
//! 4. **Session** — a random session token is issued; only its SHA-256
//!    hash is stored, with a TTL. Logout deletes the row.
//!
//! ## Single Administrator
//!
//! The sites have exactly one administrator. The record is provisioned
//! once, outside the service (see `db/sql/01_kustos.sql` and the
//! `hash-password` binary), and is only mutated by TOTP (re)enrollment.
//!
//! ## Abuse Protection
//!
//! Password and code submissions are tracked in `login_attempts`:
//! rolling 10-minute windows per IP and globally, plus a 15-minute
//! cooldown after 3 consecutive failures.

pub mod api;
pub mod cli;
pub mod credentials;
pub mod totp;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
