//! Argon2 password hashing and verification.

use anyhow::{Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};

/// Hash a password with Argon2id and a fresh random salt.
///
/// Used by the `hash-password` provisioning binary, never on the login path.
///
/// # Errors
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("Password hashing failed: {err}"))
}

/// Compare a candidate against the stored hash.
///
/// A mismatch is `Ok(false)`; only a malformed stored hash is an error, since
/// that means the administrator row was provisioned incorrectly. The
/// comparison itself is delegated to Argon2's verifier, which is constant
/// time. The plaintext never leaves this function.
///
/// # Errors
/// Returns an error if the stored hash cannot be parsed.
pub fn verify_password(candidate: &SecretString, stored_hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|err| anyhow!("Invalid stored hash: {err}"))?;

    match Argon2::default().verify_password(candidate.expose_secret().as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(anyhow!("Password verification failed: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn hash_and_verify_round_trip() -> Result<()> {
        let hash = hash_password("gallery-opening-2024")?;
        assert!(verify_password(&secret("gallery-opening-2024"), &hash)?);
        assert!(!verify_password(&secret("gallery-opening-2025"), &hash)?);
        Ok(())
    }

    #[test]
    fn verify_rejects_empty_and_near_misses() -> Result<()> {
        let hash = hash_password("correct horse battery staple")?;
        assert!(!verify_password(&secret(""), &hash)?);
        // One character off must fail.
        assert!(!verify_password(&secret("correct horse battery stapl"), &hash)?);
        assert!(!verify_password(&secret("correct horse battery staplf"), &hash)?);
        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> Result<()> {
        let first = hash_password("same-password")?;
        let second = hash_password("same-password")?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(verify_password(&secret("anything"), "not-a-phc-string").is_err());
    }
}
