//! Database-backed rate limiting for the login flow.
//!
//! Flow Overview:
//! 1) Track every password/code submission in the `login_attempts` table.
//! 2) Enforce rolling window limits (10 per IP, 20 globally in 10 minutes;
//!    the global limit works because there is exactly one administrator).
//! 3) Trigger a 15-minute cooldown after 3 consecutive failures.
//!
//! Attempts default to failed and are flipped to success afterwards, so a
//! crash mid-flow still counts against the caller.

use anyhow::Result;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{Instrument, error};
use uuid::Uuid;

const ATTEMPT_WINDOW: Duration = Duration::from_secs(10 * 60);
const IP_ATTEMPT_LIMIT: i64 = 10;
const GLOBAL_ATTEMPT_LIMIT: i64 = 20;
const FAILURE_LIMIT: i64 = 3;
const COOLDOWN_DURATION: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoginRateLimitError {
    #[error("Rate limited")]
    Limited,
    #[error("Cooldown active: {remaining_seconds}s remaining")]
    Cooldown { remaining_seconds: u64 },
}

#[derive(Clone, Debug)]
pub struct LoginRateLimiter {
    pool: PgPool,
}

impl LoginRateLimiter {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Checks limits and registers a new attempt.
    ///
    /// # Errors
    /// Returns `LoginRateLimitError::Limited` if rolling window limits are
    /// exceeded, `LoginRateLimitError::Cooldown` during a failure-triggered
    /// cooldown.
    pub async fn register_attempt(&self, ip: Option<&str>) -> Result<Uuid, LoginRateLimitError> {
        let cooldown = self.cooldown_seconds().await;
        if cooldown > 0 {
            return Err(LoginRateLimitError::Cooldown {
                remaining_seconds: cooldown,
            });
        }

        // Global rolling window; fail closed on storage errors.
        let total_attempts = self.count_recent_attempts().await.map_err(|err| {
            error!("Failed to count login attempts: {err}");
            LoginRateLimitError::Limited
        })?;
        if total_attempts >= GLOBAL_ATTEMPT_LIMIT {
            return Err(LoginRateLimitError::Limited);
        }

        if let Some(ip) = ip {
            let ip_attempts = self.count_ip_attempts(ip).await.map_err(|err| {
                error!("Failed to count per-IP login attempts: {err}");
                LoginRateLimitError::Limited
            })?;
            if ip_attempts >= IP_ATTEMPT_LIMIT {
                return Err(LoginRateLimitError::Limited);
            }
        }

        // Pessimistic insert: is_failure stays TRUE unless record_success runs.
        let query =
            "INSERT INTO login_attempts (ip_address, is_failure) VALUES ($1::inet, TRUE) RETURNING id";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT"
        );
        let row = sqlx::query(query)
            .bind(ip)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| {
                error!("Failed to register login attempt: {err}");
                LoginRateLimitError::Limited
            })?;

        Ok(row.get(0))
    }

    /// Confirms that the attempt succeeded by clearing the failure flag.
    pub async fn record_success(&self, attempt_id: Uuid) {
        let query = "UPDATE login_attempts SET is_failure = FALSE WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE"
        );
        if let Err(err) = sqlx::query(query)
            .bind(attempt_id)
            .execute(&self.pool)
            .instrument(span)
            .await
        {
            error!("Failed to record login success: {err}");
        }
    }

    /// Returns the remaining cooldown time in seconds.
    pub async fn cooldown_seconds(&self) -> u64 {
        let query = r"
            WITH last_attempts AS (
                SELECT is_failure, created_at
                FROM login_attempts
                ORDER BY created_at DESC
                LIMIT $1
            )
            SELECT MAX(created_at) AS last_failure_at
            FROM last_attempts
            HAVING COUNT(*) = $1 AND BOOL_AND(is_failure)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT"
        );
        let row = sqlx::query(query)
            .bind(FAILURE_LIMIT)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(Some(row)) => {
                let last_failure_at: chrono::DateTime<chrono::Utc> = row.get("last_failure_at");
                let now = chrono::Utc::now();
                let elapsed = now.signed_duration_since(last_failure_at);
                let cooldown_secs = i64::try_from(COOLDOWN_DURATION.as_secs()).unwrap_or(i64::MAX);
                if elapsed.num_seconds() < cooldown_secs {
                    u64::try_from(cooldown_secs - elapsed.num_seconds()).unwrap_or(0)
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    async fn count_recent_attempts(&self) -> Result<i64> {
        let query =
            "SELECT COUNT(*) FROM login_attempts WHERE created_at > NOW() - $1::interval";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT"
        );
        let row = sqlx::query(query)
            .bind(format!("{} seconds", ATTEMPT_WINDOW.as_secs()))
            .fetch_one(&self.pool)
            .instrument(span)
            .await?;
        Ok(row.get(0))
    }

    async fn count_ip_attempts(&self, ip: &str) -> Result<i64> {
        let query = "SELECT COUNT(*) FROM login_attempts WHERE ip_address = $1::inet AND created_at > NOW() - $2::interval";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT"
        );
        let row = sqlx::query(query)
            .bind(ip)
            .bind(format!("{} seconds", ATTEMPT_WINDOW.as_secs()))
            .fetch_one(&self.pool)
            .instrument(span)
            .await?;
        Ok(row.get(0))
    }
}

#[cfg(test)]
mod tests {
    use super::LoginRateLimitError;

    #[test]
    fn error_messages_do_not_leak_detail() {
        assert_eq!(LoginRateLimitError::Limited.to_string(), "Rate limited");
        assert_eq!(
            LoginRateLimitError::Cooldown {
                remaining_seconds: 90
            }
            .to_string(),
            "Cooldown active: 90s remaining"
        );
    }
}
