//! OTP repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::OtpEntity;
use crate::metrics::QueryTimer;

/// Repository for phone verification codes.
#[derive(Clone)]
pub struct OtpRepository {
    pool: PgPool,
}

impl OtpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a fresh code for `mobile`, replacing any previous one and
    /// resetting its verified flag and attempt counter.
    pub async fn upsert(
        &self,
        mobile: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<OtpEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_otp");
        let result = sqlx::query_as::<_, OtpEntity>(
            r#"
            INSERT INTO otps (mobile, code_hash, expires_at, verified, attempts)
            VALUES ($1, $2, $3, FALSE, 0)
            ON CONFLICT (mobile) DO UPDATE
            SET code_hash = EXCLUDED.code_hash,
                expires_at = EXCLUDED.expires_at,
                verified = FALSE,
                attempts = 0,
                created_at = NOW()
            RETURNING mobile, code_hash, expires_at, verified, attempts, created_at
            "#,
        )
        .bind(mobile)
        .bind(code_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find(&self, mobile: &str) -> Result<Option<OtpEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_otp");
        let result = sqlx::query_as::<_, OtpEntity>(
            r#"
            SELECT mobile, code_hash, expires_at, verified, attempts, created_at
            FROM otps
            WHERE mobile = $1
            "#,
        )
        .bind(mobile)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Records a wrong guess and returns the new attempt count.
    ///
    /// The increment only applies while the row is below `max_attempts`, so
    /// concurrent guesses cannot push past the lockout. `None` means the code
    /// is locked or gone.
    pub async fn increment_attempts(
        &self,
        mobile: &str,
        max_attempts: i32,
    ) -> Result<Option<i32>, sqlx::Error> {
        let timer = QueryTimer::new("increment_otp_attempts");
        let result = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE otps
            SET attempts = attempts + 1
            WHERE mobile = $1 AND attempts < $2
            RETURNING attempts
            "#,
        )
        .bind(mobile)
        .bind(max_attempts)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Flags the code as verified if it still matches `code_hash`, is not
    /// locked and has not expired. Returns whether the row was updated.
    pub async fn mark_verified(
        &self,
        mobile: &str,
        code_hash: &str,
        max_attempts: i32,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("mark_otp_verified");
        let result = sqlx::query(
            r#"
            UPDATE otps
            SET verified = TRUE
            WHERE mobile = $1
              AND code_hash = $2
              AND attempts < $3
              AND expires_at > NOW()
            "#,
        )
        .bind(mobile)
        .bind(code_hash)
        .bind(max_attempts)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Returns whether a row was removed.
    pub async fn delete(&self, mobile: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_otp");
        let result = sqlx::query("DELETE FROM otps WHERE mobile = $1")
            .bind(mobile)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Deletes unverified codes that expired before `cutoff`.
    pub async fn delete_stale(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_stale_otps");
        let result = sqlx::query("DELETE FROM otps WHERE verified = FALSE AND expires_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
