//! OTP entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the otps table.
#[derive(Debug, Clone, FromRow)]
pub struct OtpEntity {
    pub mobile: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl From<OtpEntity> for domain::models::Otp {
    fn from(entity: OtpEntity) -> Self {
        Self {
            mobile: entity.mobile,
            code_hash: entity.code_hash,
            expires_at: entity.expires_at,
            verified: entity.verified,
            attempts: entity.attempts,
            created_at: entity.created_at,
        }
    }
}
