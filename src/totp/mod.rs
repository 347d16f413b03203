//! RFC 6238 time-based one-time passwords.
//!
//! Secrets are 160-bit random values encoded as base32 (RFC 4648) and
//! presented to authenticator apps as an `otpauth://totp/...` URI, rendered
//! as a QR data URL. Verification accepts the current 30-second window plus
//! one step on either side to absorb client/server clock drift; anything
//! that is not exactly six ASCII digits is rejected outright.

mod engine;

pub use engine::{DIGITS, STEP_SECONDS, TotpEngine, TotpError};
