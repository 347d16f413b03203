//! Database access for the administrator record.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::ADMIN_ID;

/// The singleton administrator row.
#[derive(Debug)]
pub struct AdminRecord {
    pub password_hash: String,
    /// Base32 secret, pending or confirmed.
    pub totp_secret: Option<String>,
    /// Only a confirmed secret counts as an enrolled second factor.
    pub totp_confirmed: bool,
}

impl AdminRecord {
    /// Enrollment state as exposed to the login flow: a pending secret does
    /// not count, so an interrupted enrollment restarts cleanly.
    #[must_use]
    pub fn has_totp_secret(&self) -> bool {
        self.totp_secret.is_some() && self.totp_confirmed
    }
}

/// Fetch the administrator record.
///
/// `Ok(None)` means the row was never provisioned; callers treat that as a
/// server error since login is impossible without it.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn fetch_admin(pool: &PgPool) -> Result<Option<AdminRecord>> {
    let query = r"
        SELECT password_hash, totp_secret, totp_confirmed_at IS NOT NULL AS totp_confirmed
        FROM administrator
        WHERE id = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(ADMIN_ID)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch administrator record")?;

    Ok(row.map(|row| AdminRecord {
        password_hash: row.get("password_hash"),
        totp_secret: row.get("totp_secret"),
        totp_confirmed: row.get("totp_confirmed"),
    }))
}

/// Persist a freshly generated secret in the pending state.
///
/// Overwrites any previous secret and clears the confirmation timestamp, so
/// re-enrollment always starts from scratch.
///
/// # Errors
/// Returns an error if the update fails or no administrator row exists.
pub async fn set_pending_totp_secret(pool: &PgPool, secret: &str) -> Result<()> {
    let query = r"
        UPDATE administrator
        SET totp_secret = $2,
            totp_confirmed_at = NULL,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(ADMIN_ID)
        .bind(secret)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store pending TOTP secret")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("administrator record is not provisioned");
    }
    Ok(())
}

/// Mark the pending secret as confirmed after the first valid code.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn confirm_totp_secret(pool: &PgPool) -> Result<()> {
    let query = r"
        UPDATE administrator
        SET totp_confirmed_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
          AND totp_secret IS NOT NULL
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(ADMIN_ID)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to confirm TOTP secret")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::AdminRecord;

    #[test]
    fn pending_secret_does_not_count_as_enrolled() {
        let record = AdminRecord {
            password_hash: "$argon2id$stub".to_string(),
            totp_secret: Some("JBSWY3DPEHPK3PXP".to_string()),
            totp_confirmed: false,
        };
        assert!(!record.has_totp_secret());
    }

    #[test]
    fn confirmed_secret_counts_as_enrolled() {
        let record = AdminRecord {
            password_hash: "$argon2id$stub".to_string(),
            totp_secret: Some("JBSWY3DPEHPK3PXP".to_string()),
            totp_confirmed: true,
        };
        assert!(record.has_totp_secret());
    }

    #[test]
    fn missing_secret_is_not_enrolled() {
        let record = AdminRecord {
            password_hash: "$argon2id$stub".to_string(),
            totp_secret: None,
            totp_confirmed: false,
        };
        assert!(!record.has_totp_secret());
    }
}
